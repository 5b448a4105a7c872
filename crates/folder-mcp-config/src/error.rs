//! Configuration error types.

use thiserror::Error;

/// Configuration-related errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A folder's `path` does not exist or is not a directory.
    #[error("folder path does not exist or is not a directory: {path}")]
    InvalidFolderPath {
        /// The offending path.
        path: String,
    },

    /// A folder names an embedding model no registered backend knows.
    #[error("unknown embedding model: {model}")]
    UnknownModel {
        /// The offending model identifier.
        model: String,
    },

    /// Missing required field.
    #[error("missing required field: {field}")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// A numeric value fell outside its allowed range.
    #[error("value {value} is out of range for {field} (expected {min}-{max})")]
    OutOfRange {
        /// Name of the field.
        field: String,
        /// The rejected value.
        value: u64,
        /// Minimum allowed value, inclusive.
        min: u64,
        /// Maximum allowed value, inclusive.
        max: u64,
    },

    /// JSON parsing error.
    #[error("JSON parsing error: {0}")]
    JsonParsing(#[from] serde_json::Error),

    /// TOML parsing error.
    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    /// YAML parsing error.
    #[error("YAML parsing error: {0}")]
    YamlParsing(#[from] serde_yaml::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid profile string.
    #[error("invalid profile: {0}")]
    InvalidProfile(String),

    /// Generic error message.
    #[error("configuration error: {message}")]
    Generic {
        /// Human-readable description.
        message: String,
    },
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

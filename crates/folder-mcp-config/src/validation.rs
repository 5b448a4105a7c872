//! Configuration validation framework.

use crate::{ConfigError, ConfigResult};

/// Implemented by every configuration struct that can be checked for
/// internal consistency once assembled from its sources.
pub trait Validate {
    /// Validate this configuration object.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] describing the first violation found.
    fn validate(&self) -> ConfigResult<()>;
}

/// Validate that `path` exists and is a directory.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidFolderPath`] if `path` does not exist or is
/// not a directory.
pub fn validate_folder_path(path: &std::path::Path) -> ConfigResult<()> {
    if path.is_dir() {
        Ok(())
    } else {
        Err(ConfigError::InvalidFolderPath {
            path: path.display().to_string(),
        })
    }
}

/// Validate a value is within `[min, max]`.
///
/// # Errors
///
/// Returns [`ConfigError::OutOfRange`] if `value` falls outside the range.
pub fn validate_range(value: u64, min: u64, max: u64, field_name: &str) -> ConfigResult<()> {
    if value < min || value > max {
        Err(ConfigError::OutOfRange {
            field: field_name.to_string(),
            value,
            min,
            max,
        })
    } else {
        Ok(())
    }
}

/// Validate a string is non-empty once trimmed.
///
/// # Errors
///
/// Returns [`ConfigError::MissingField`] if `value` is empty or whitespace.
pub fn validate_non_empty(value: &str, field_name: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        Err(ConfigError::MissingField {
            field: field_name.to_string(),
        })
    } else {
        Ok(())
    }
}

/// Validate that `model` is known to at least one of `known_models`.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownModel`] if no backend advertises the model.
pub fn validate_known_model(model: &str, known_models: &[&str]) -> ConfigResult<()> {
    if known_models.contains(&model) {
        Ok(())
    } else {
        Err(ConfigError::UnknownModel {
            model: model.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_missing_folder_path() {
        let path = std::path::Path::new("/definitely/not/a/real/path/hopefully");
        assert!(validate_folder_path(path).is_err());
    }

    #[test]
    fn accepts_existing_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_folder_path(dir.path()).is_ok());
    }

    #[test]
    fn range_check_rejects_out_of_bounds() {
        assert!(validate_range(5, 10, 20, "batch_size").is_err());
        assert!(validate_range(15, 10, 20, "batch_size").is_ok());
    }

    #[test]
    fn known_model_check() {
        assert!(validate_known_model("local-default", &["local-default"]).is_ok());
        assert!(validate_known_model("gpt-unknown", &["local-default"]).is_err());
    }
}

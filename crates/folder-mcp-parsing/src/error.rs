//! Error types for the parsing and chunking crate.

use thiserror::Error;

/// Parsing and chunking errors.
#[derive(Error, Debug)]
pub enum ParsingError {
    /// No registered parser declares support for this extension.
    #[error("unsupported file type: {0}")]
    UnsupportedType(String),

    /// A parser could not make sense of the document's content.
    #[error("parse error: {0}")]
    ParseError(String),

    /// Chunking failed to produce a well-formed chunk set.
    #[error("chunking error: {0}")]
    ChunkingError(String),

    /// Token counting failed.
    #[error("token counting error: {0}")]
    TokenCountingError(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Anyhow error wrapper.
    #[error("generic error: {0}")]
    AnyhowError(#[from] anyhow::Error),
}

impl From<ParsingError> for folder_mcp_common::FolderMcpError {
    fn from(e: ParsingError) -> Self {
        match e {
            ParsingError::UnsupportedType(msg) => Self::InvalidInput(msg),
            ParsingError::ParseError(msg) => Self::ParseError(msg),
            ParsingError::ChunkingError(msg) => Self::ParseError(msg),
            ParsingError::TokenCountingError(msg) => Self::ParseError(msg),
            ParsingError::IoError(err) => Self::Internal(err.to_string()),
            ParsingError::AnyhowError(err) => Self::Internal(err.to_string()),
        }
    }
}

/// Result type alias for parsing operations.
pub type ParsingResult<T> = Result<T, ParsingError>;

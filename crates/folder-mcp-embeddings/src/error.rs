//! Error types for embedding generation.

use thiserror::Error;

/// Result type alias for embedding operations.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// Errors an [`crate::EmbeddingProvider`] or [`crate::EmbeddingService`] can
/// raise. All are treated as retryable at the MCP boundary except
/// `Config`, which indicates a setup mistake retrying won't fix.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// The provider isn't configured correctly (unknown model, bad dimension).
    #[error("embedding configuration error: {0}")]
    Config(String),

    /// Tokenization failed ahead of embedding.
    #[error("tokenization failed: {0}")]
    Tokenization(String),

    /// The embedding computation itself failed.
    #[error("embedding generation failed: {0}")]
    Generation(String),

    /// I/O error, e.g. reading a cached model artifact.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Anything else.
    #[error("other error: {0}")]
    Other(String),
}

impl From<anyhow::Error> for EmbeddingError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<EmbeddingError> for folder_mcp_common::FolderMcpError {
    fn from(e: EmbeddingError) -> Self {
        let retryable = !matches!(e, EmbeddingError::Config(_));
        Self::ModelError {
            message: e.to_string(),
            retryable,
        }
    }
}

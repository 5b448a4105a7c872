//! Error types for folder lifecycle, change detection, and the indexing pipeline.

use thiserror::Error;

/// Result type alias for orchestrator operations.
pub type OrchestratorResult<T> = Result<T, OrchestratorError>;

/// Errors the orchestrator, lifecycle, or pipeline can raise.
#[derive(Error, Debug)]
pub enum OrchestratorError {
    /// The folder path doesn't exist or isn't a directory.
    #[error("invalid folder path: {0}")]
    InvalidFolder(String),

    /// No folder is registered under the given id/path.
    #[error("folder not found: {0}")]
    FolderNotFound(String),

    /// A lifecycle transition was requested that isn't permitted from the
    /// current state.
    #[error("illegal transition: {from} -> {attempted}")]
    IllegalTransition { from: String, attempted: String },

    /// Walking the folder tree failed.
    #[error("scan failed: {0}")]
    Scan(#[from] ignore::Error),

    /// Reading a file's bytes or metadata during a scan failed.
    #[error("I/O error during scan: {0}")]
    Io(#[from] std::io::Error),

    /// Setting up filesystem watching failed.
    #[error("watch failed: {0}")]
    Watch(#[from] notify::Error),

    /// The parser, chunker, embedder, or store returned an unrecoverable error.
    #[error(transparent)]
    Store(#[from] folder_mcp_store::StoreError),

    #[error(transparent)]
    Parsing(#[from] folder_mcp_parsing::ParsingError),

    #[error(transparent)]
    Embedding(#[from] folder_mcp_embeddings::EmbeddingError),

    /// Releasing database handles before teardown exceeded the configured
    /// retry ceiling.
    #[error("handle release timed out after {0:?}")]
    HandleReleaseTimeout(std::time::Duration),

    /// Anything else.
    #[error("other error: {0}")]
    Other(String),
}

impl From<OrchestratorError> for folder_mcp_common::FolderMcpError {
    fn from(e: OrchestratorError) -> Self {
        match e {
            OrchestratorError::InvalidFolder(m) => Self::InvalidInput(m),
            OrchestratorError::FolderNotFound(m) => Self::NotFound(m),
            OrchestratorError::Store(store_err) => store_err.into(),
            OrchestratorError::Parsing(parse_err) => parse_err.into(),
            OrchestratorError::Embedding(embed_err) => embed_err.into(),
            other => Self::Internal(other.to_string()),
        }
    }
}

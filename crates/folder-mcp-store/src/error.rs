//! Error types for the embedding store.

use thiserror::Error;

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors the embedding store can raise. `busy` errors are transient lock
/// contention and are safe to retry; the rest indicate a structural problem.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite is busy/locked; caller may retry.
    #[error("store is busy: {0}")]
    Busy(String),

    /// A query or transaction failed for a reason other than lock contention.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Schema migration failed on open.
    #[error("migration failed: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A referenced document or chunk doesn't exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Stored JSON (location/semantic metadata) failed to parse.
    #[error("corrupt row data: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Caller passed a vector whose length doesn't match the stored dimension.
    #[error("vector dimension mismatch: {0}")]
    DimensionMismatch(String),
}

impl StoreError {
    /// Whether this failure is safe to retry without caller-side changes.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Busy(_) => true,
            Self::Database(e) => is_busy_or_locked(e) || matches!(e, sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)),
            _ => false,
        }
    }
}

/// SQLite reports lock contention as extended error codes `5` (`SQLITE_BUSY`)
/// and `6` (`SQLITE_LOCKED`).
fn is_busy_or_locked(e: &sqlx::Error) -> bool {
    let Some(db_err) = e.as_database_error() else {
        return false;
    };
    matches!(db_err.code().as_deref(), Some("5") | Some("6"))
}

impl From<StoreError> for folder_mcp_common::FolderMcpError {
    fn from(e: StoreError) -> Self {
        let retryable = e.is_retryable();
        Self::StoreError {
            message: e.to_string(),
            retryable,
        }
    }
}

//! Cross-crate error taxonomy.
//!
//! Every crate in the workspace ultimately produces a [`FolderMcpError`], which
//! the `folder-mcp` binary maps onto the MCP response envelope's
//! machine-readable status tokens.

use std::fmt;

/// Common error variants that appear across multiple crates.
///
/// Mirrors the constructor-based trait pattern used across the workspace so
/// crate-local error enums can still implement `From<std::io::Error>` etc.
/// via [`impl_common_conversions`] without each crate re-deriving the same
/// boilerplate.
pub trait CommonError: std::error::Error + Send + Sync + 'static {
    /// Create an I/O error variant.
    fn io_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;

    /// Create a configuration error variant.
    fn config_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;

    /// Create a parsing error variant.
    fn parse_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;

    /// Create a generic "other" error variant.
    fn other_error(msg: impl Into<String>) -> Self
    where
        Self: Sized;
}

/// Adds context to a `Result`'s error, similar to `anyhow::Context` but usable
/// on any `std::error::Error` without requiring `anyhow` in the leaf crate.
pub trait ErrorContext<T> {
    /// Add static or owned context to an error.
    fn context<C>(self, context: C) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static;

    /// Add context computed lazily, only when the result is an error.
    fn with_context<C, F>(self, f: F) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C;
}

impl<T, E> ErrorContext<T> for Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn context<C>(self, context: C) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
    {
        self.map_err(|e| format!("{context}: {e}"))
    }

    fn with_context<C, F>(self, f: F) -> Result<T, String>
    where
        C: fmt::Display + Send + Sync + 'static,
        F: FnOnce() -> C,
    {
        self.map_err(|e| format!("{}: {}", f(), e))
    }
}

/// Generates `From<std::io::Error>` and `From<anyhow::Error>` impls for an
/// error type that implements [`CommonError`].
#[macro_export]
macro_rules! impl_common_conversions {
    ($error_type:ident) => {
        impl From<std::io::Error> for $error_type {
            fn from(e: std::io::Error) -> Self {
                <$error_type as $crate::CommonError>::io_error(e.to_string())
            }
        }

        impl From<anyhow::Error> for $error_type {
            fn from(e: anyhow::Error) -> Self {
                <$error_type as $crate::CommonError>::other_error(e.to_string())
            }
        }
    };

    ($error_type:ident, with_serde) => {
        impl_common_conversions!($error_type);

        impl From<serde_json::Error> for $error_type {
            fn from(e: serde_json::Error) -> Self {
                <$error_type as $crate::CommonError>::parse_error(format!("JSON: {e}"))
            }
        }
    };
}

/// The error taxonomy every MCP-facing operation reduces to.
///
/// Variants carry a `retryable` flag where the origin distinguishes
/// transient failures (model backend hiccup, store momentarily busy) from
/// permanent ones, so handlers can decide whether to surface a `CONTINUE`
/// action or fail outright.
#[derive(Debug, thiserror::Error)]
pub enum FolderMcpError {
    /// Caller supplied a malformed or out-of-range argument.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The referenced folder, document, or chunk does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A parser failed to make sense of document content.
    #[error("parse error: {0}")]
    ParseError(String),

    /// The embedding provider failed.
    #[error("model error: {0}")]
    ModelError {
        /// Human-readable description.
        message: String,
        /// Whether retrying the same request might succeed.
        retryable: bool,
    },

    /// The embedding store failed.
    #[error("store error: {0}")]
    StoreError {
        /// Human-readable description.
        message: String,
        /// Whether retrying the same request might succeed.
        retryable: bool,
    },

    /// The operation was cancelled by the caller or by shutdown.
    #[error("cancelled: {0}")]
    Cancelled(String),

    /// Anything else: bugs, invariant violations, unexpected I/O failures.
    #[error("internal error: {0}")]
    Internal(String),
}

impl FolderMcpError {
    /// Machine-readable status token for the MCP response envelope.
    #[must_use]
    pub const fn to_mcp_status(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "INVALID_ARGUMENT",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ParseError(_) => "PARSE_FAILED",
            Self::ModelError { .. } => "MODEL_UNAVAILABLE",
            Self::StoreError { .. } => "STORE_UNAVAILABLE",
            Self::Cancelled(_) => "CANCELLED",
            Self::Internal(_) => "INTERNAL",
        }
    }

    /// Whether retrying the same request might succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ModelError { retryable: true, .. } | Self::StoreError { retryable: true, .. }
        )
    }
}

impl CommonError for FolderMcpError {
    fn io_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    fn config_error(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    fn parse_error(msg: impl Into<String>) -> Self {
        Self::ParseError(msg.into())
    }

    fn other_error(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

impl_common_conversions!(FolderMcpError, with_serde);

/// Convenience alias used throughout the workspace.
pub type FolderMcpResult<T> = Result<T, FolderMcpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_retryable_store_error_to_store_unavailable() {
        let err = FolderMcpError::StoreError {
            message: "locked".into(),
            retryable: true,
        };
        assert_eq!(err.to_mcp_status(), "STORE_UNAVAILABLE");
        assert!(err.is_retryable());
    }

    #[test]
    fn maps_non_retryable_model_error() {
        let err = FolderMcpError::ModelError {
            message: "bad weights".into(),
            retryable: false,
        };
        assert_eq!(err.to_mcp_status(), "MODEL_UNAVAILABLE");
        assert!(!err.is_retryable());
    }

    #[test]
    fn context_prefixes_the_error_message() {
        let result: Result<(), FolderMcpError> =
            Err(FolderMcpError::NotFound("doc-1".into()));
        let with_context = result.context("loading document");
        assert!(with_context.unwrap_err().contains("loading document"));
    }

    #[test]
    fn io_error_converts_via_from() {
        let io_err = std::io::Error::other("disk full");
        let err: FolderMcpError = io_err.into();
        assert_eq!(err.to_mcp_status(), "INTERNAL");
    }
}

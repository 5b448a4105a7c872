//! Shared primitives used by every folder-mcp crate: correlation ids, the
//! cross-crate error taxonomy, content hashing, and tracing initialization.

pub mod error;
pub mod hash;
pub mod ids;
pub mod init;
pub mod tracing_setup;

pub use error::{CommonError, ErrorContext, FolderMcpError, FolderMcpResult};
pub use hash::content_hash;
pub use ids::CorrelationId;

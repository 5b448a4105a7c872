use folder_mcp_common::CorrelationId;
use thiserror::Error;

/// Search-specific error types with correlation id support.
#[derive(Error, Debug)]
pub enum SearchError {
    #[error("invalid query (correlation: {correlation_id}): {reason}")]
    InvalidQuery {
        reason: String,
        correlation_id: CorrelationId,
    },

    /// A regex pattern compiled into an automaton too large to run safely.
    #[error("pattern too expensive (correlation: {correlation_id}): {reason}")]
    PatternTooExpensive {
        reason: String,
        correlation_id: CorrelationId,
    },

    #[error("store unavailable (correlation: {correlation_id})")]
    StoreUnavailable { correlation_id: CorrelationId },

    #[error(
        "search timeout after {timeout_ms}ms for query '{query}' (correlation: {correlation_id})"
    )]
    SearchTimeout {
        query: String,
        timeout_ms: u64,
        correlation_id: CorrelationId,
    },

    #[error("embedding error: {0}")]
    Embedding(#[from] folder_mcp_embeddings::EmbeddingError),

    #[error("store error: {0}")]
    Store(#[from] folder_mcp_store::StoreError),
}

/// Result type alias for search operations.
pub type SearchResult<T> = std::result::Result<T, SearchError>;

impl SearchError {
    /// Whether retrying the same request without caller-side changes might
    /// succeed. Only store lock contention and a generic store-unavailable
    /// condition are considered transient; malformed queries never are.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.is_retryable(),
            Self::StoreUnavailable { .. } => true,
            Self::InvalidQuery { .. }
            | Self::PatternTooExpensive { .. }
            | Self::SearchTimeout { .. }
            | Self::Embedding(_) => false,
        }
    }
}

impl From<SearchError> for folder_mcp_common::FolderMcpError {
    fn from(e: SearchError) -> Self {
        let message = e.to_string();
        match e {
            SearchError::InvalidQuery { reason, .. } => Self::InvalidInput(reason),
            SearchError::PatternTooExpensive { reason, .. } => Self::InvalidInput(reason),
            SearchError::StoreUnavailable { .. } => Self::StoreError {
                message,
                retryable: true,
            },
            SearchError::SearchTimeout { .. } => Self::Cancelled(message),
            SearchError::Embedding(embed_err) => embed_err.into(),
            SearchError::Store(store_err) => store_err.into(),
        }
    }
}

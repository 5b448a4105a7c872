//! The search service contract.

use super::types::{SearchMatch, SearchRequest};
use crate::error::SearchResult;
use async_trait::async_trait;
use folder_mcp_common::CorrelationId;
use folder_mcp_store::EmbeddingStore;
use std::sync::Arc;

/// One candidate store to search: a folder id paired with its (physically
/// separate, per-folder) embedding store.
pub type StoreHandle = (String, Arc<dyn EmbeddingStore>);

/// Trait for search operations with correlation id support.
///
/// Unlike a single tenant-partitioned vector store, each folder here owns its
/// own physical SQLite store, so callers pass the candidate set of stores to
/// search rather than the service owning one store for its whole lifetime.
#[async_trait]
pub trait SearchService: Send + Sync {
    /// Search across the given folder stores, ranked highest score first.
    async fn search(
        &self,
        stores: &[StoreHandle],
        request: &SearchRequest,
        correlation_id: &CorrelationId,
    ) -> SearchResult<Vec<SearchMatch>>;
}

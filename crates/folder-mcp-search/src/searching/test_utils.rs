//! Test utilities for search services.

use super::service::{SearchService, StoreHandle};
use super::types::{MatchContext, SearchMatch, SearchRequest};
use crate::error::SearchResult;
use async_trait::async_trait;
use folder_mcp_common::CorrelationId;
use folder_mcp_parsing::chunking::Location;

/// A mock match spec: `(document_id, preview, score)`.
type MockMatch = (String, String, f32);

/// Mock search service for testing callers of [`SearchService`].
pub struct MockSearch {
    results: Vec<SearchMatch>,
}

impl MockSearch {
    /// Create a mock that returns specific results.
    #[must_use]
    pub fn with_results(results: Vec<MockMatch>) -> Self {
        let results = results
            .into_iter()
            .map(|(document_id, preview, score)| SearchMatch {
                document_id: document_id.clone(),
                chunk_id: format!("{document_id}-chunk-0"),
                folder_id: "folder-under-test".to_string(),
                preview,
                score,
                location: Location::Lines { start: 1, end: 1 },
                context: MatchContext::default(),
                document_type: "txt".to_string(),
            })
            .collect();
        Self { results }
    }

    /// Create a mock that returns no results.
    #[must_use]
    pub fn empty() -> Self {
        Self { results: Vec::new() }
    }
}

#[async_trait]
impl SearchService for MockSearch {
    async fn search(
        &self,
        _stores: &[StoreHandle],
        request: &SearchRequest,
        _correlation_id: &CorrelationId,
    ) -> SearchResult<Vec<SearchMatch>> {
        Ok(self.results.iter().take(request.limit).cloned().collect())
    }
}

//! Request/response shapes for the search endpoint.

use folder_mcp_parsing::chunking::Location;

/// How a query is evaluated against stored chunks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// Vector similarity against embeddings.
    Semantic,
    /// Server-side compiled-pattern scan over chunk text.
    Regex,
}

/// Whether results are reported one per matching document or one per chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchScope {
    /// Best-scoring chunk per document, deduplicated.
    Documents,
    /// Every matching chunk, independently ranked.
    Chunks,
}

/// Narrows a search to a folder and/or file extension.
#[derive(Debug, Clone, Default)]
pub struct QueryFilters {
    pub folder_id: Option<String>,
    pub file_type: Option<String>,
}

/// One search request.
#[derive(Debug, Clone)]
pub struct SearchRequest {
    pub query: String,
    pub mode: SearchMode,
    pub scope: SearchScope,
    pub filters: QueryFilters,
    pub limit: usize,
}

/// Surrounding text for a match, taken from the adjacent chunks in the same
/// document.
#[derive(Debug, Clone, Default)]
pub struct MatchContext {
    pub before: String,
    pub after: String,
}

/// One ranked search result.
#[derive(Debug, Clone)]
pub struct SearchMatch {
    pub document_id: String,
    pub chunk_id: String,
    pub folder_id: String,
    pub preview: String,
    pub score: f32,
    pub location: Location,
    pub context: MatchContext,
    pub document_type: String,
}

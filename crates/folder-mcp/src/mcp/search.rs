//! The `search` endpoint: ranked semantic or regex search across one or all
//! registered folders.

use agenterra_rmcp::model::CallToolResult;
use agenterra_rmcp::Error as McpError;
use folder_mcp_common::CorrelationId;
use folder_mcp_search::{QueryFilters, SearchError, SearchMode, SearchRequest, SearchScope};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::continuation::ContinuationToken;
use crate::envelope::{DEFAULT_MAX_TOKENS, Envelope, paginate_from};
use crate::mcp::{AppState, envelope_result, error_result};

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SearchFilters {
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default, rename = "fileType")]
    pub file_type: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct SearchParams {
    pub query: String,
    #[serde(default = "default_mode")]
    pub mode: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default)]
    pub filters: Option<SearchFilters>,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

fn default_mode() -> String {
    "semantic".to_string()
}

fn default_scope() -> String {
    "documents".to_string()
}

#[derive(Debug, Clone, Serialize)]
struct ResultMetadata {
    document_type: String,
}

#[derive(Debug, Clone, Serialize)]
struct SearchResultItem {
    document_id: String,
    preview: String,
    score: f32,
    location: folder_mcp_parsing::chunking::Location,
    context: Context,
    metadata: ResultMetadata,
}

#[derive(Debug, Clone, Serialize)]
struct Context {
    before: String,
    after: String,
}

#[derive(Debug, Clone, Serialize)]
struct SearchResponse {
    results: Vec<SearchResultItem>,
    token_count: usize,
}

/// Maps a [`SearchError`] onto its MCP status token, keeping malformed
/// queries and expensive patterns distinct from genuine store failures.
fn search_error_token(e: &SearchError) -> String {
    match e {
        SearchError::InvalidQuery { reason, .. } => format!("INVALID_ARGUMENT: {reason}"),
        SearchError::PatternTooExpensive { reason, .. } => {
            format!("PatternTooExpensive: {reason}")
        }
        SearchError::SearchTimeout { .. } => format!("PatternTooExpensive: {e}"),
        SearchError::Embedding(_) => format!("MODEL_UNAVAILABLE: {e}"),
        SearchError::StoreUnavailable { .. } | SearchError::Store(_) => {
            format!("STORE_UNAVAILABLE: {e}")
        }
    }
}

pub async fn handler(state: &AppState, params: &SearchParams) -> Result<CallToolResult, McpError> {
    let mode = match params.mode.as_str() {
        "semantic" => SearchMode::Semantic,
        "regex" => SearchMode::Regex,
        other => {
            warn!(mode = other, "invalid search mode");
            return error_result(format!("INVALID_ARGUMENT: unknown search mode '{other}'"));
        }
    };
    let scope = match params.scope.as_str() {
        "documents" => SearchScope::Documents,
        "chunks" => SearchScope::Chunks,
        other => {
            warn!(scope = other, "invalid search scope");
            return error_result(format!("INVALID_ARGUMENT: unknown search scope '{other}'"));
        }
    };

    let skip = match &params.continuation_token {
        Some(token) => match ContinuationToken::decode(token, "search", None) {
            Ok(parsed) => parsed.cursor,
            Err(e) => return error_result(format!("INVALID_ARGUMENT: {e}")),
        },
        None => 0,
    };

    let max_tokens = params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let filters = QueryFilters {
        folder_id: params.filters.as_ref().and_then(|f| f.folder.clone()),
        file_type: params.filters.as_ref().and_then(|f| f.file_type.clone()),
    };

    let all_stores = state.orchestrator.all_stores();
    let stores: Vec<_> = match &filters.folder_id {
        Some(folder_id) => all_stores
            .into_iter()
            .filter(|(id, _)| id == folder_id)
            .collect(),
        None => all_stores,
    };
    if stores.is_empty() {
        return error_result("NOT_FOUND: no matching folder is registered");
    }

    let request = SearchRequest {
        query: params.query.clone(),
        mode,
        scope,
        filters,
        // Over-fetch so pagination can decide the cut, rather than the
        // search layer silently truncating before token budgeting runs.
        limit: 200,
    };

    let matches = match state
        .search
        .search(&stores, &request, &CorrelationId::new())
        .await
    {
        Ok(matches) => matches,
        Err(e) => {
            error!(error = ?e, "search failed");
            return error_result(search_error_token(&e));
        }
    };

    let items: Vec<SearchResultItem> = matches
        .into_iter()
        .map(|m| SearchResultItem {
            document_id: m.document_id,
            preview: m.preview,
            score: m.score,
            location: m.location,
            context: Context {
                before: m.context.before,
                after: m.context.after,
            },
            metadata: ResultMetadata {
                document_type: m.document_type,
            },
        })
        .collect();

    let (included, has_more, token_count, next_cursor) =
        paginate_from(items, skip, max_tokens, |item| item.preview.len() / 4 + 16);

    let was_truncated_single_item = included.len() == 1 && token_count > max_tokens;
    let response = SearchResponse {
        results: included,
        token_count,
    };

    let mut envelope = Envelope::success(response);
    if was_truncated_single_item {
        envelope = envelope.token_limit_exceeded_but_included();
    } else if has_more {
        let token = ContinuationToken::new("search", None, next_cursor).encode();
        envelope = envelope.with_more(token);
    }

    envelope_result(envelope)
}

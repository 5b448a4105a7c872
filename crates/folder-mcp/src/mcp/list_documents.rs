//! The `list_documents` endpoint: the documents indexed under one folder,
//! paginated by token budget.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::continuation::ContinuationToken;
use crate::envelope::{DEFAULT_MAX_TOKENS, Envelope, paginate_from};
use crate::mcp::{AppState, common_error_result, envelope_result, error_result};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ListDocumentsParams {
    pub folder: String,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct DocumentEntry {
    name: String,
    document_id: String,
    modified: i64,
}

#[derive(Debug, Clone, Serialize)]
struct ListDocumentsResponse {
    documents: Vec<DocumentEntry>,
    token_count: usize,
}

/// Resolves the `folder` parameter, which accepts either a folder id or a
/// configured folder's display name.
fn resolve_folder_id(state: &AppState, folder: &str) -> Option<String> {
    let summaries = state.orchestrator.list_folders();
    if summaries.iter().any(|f| f.folder_id == folder) {
        return Some(folder.to_string());
    }
    summaries
        .into_iter()
        .find(|f| f.name == folder)
        .map(|f| f.folder_id)
}

pub async fn handler(
    state: &AppState,
    params: &ListDocumentsParams,
) -> Result<CallToolResult, McpError> {
    let Some(folder_id) = resolve_folder_id(state, &params.folder) else {
        return error_result(format!("NOT_FOUND: no folder matching '{}'", params.folder));
    };

    let store = match state.orchestrator.store_for(&folder_id) {
        Ok(store) => store,
        Err(e) => return error_result(format!("NOT_FOUND: {e}")),
    };

    let documents = match store.list_documents(&folder_id).await {
        Ok(docs) => docs,
        Err(e) => return common_error_result(e),
    };

    let mut entries: Vec<DocumentEntry> = documents
        .into_iter()
        .map(|d| DocumentEntry {
            name: d.path,
            document_id: d.id,
            modified: d.mtime,
        })
        .collect();
    entries.sort_by(|a, b| a.name.cmp(&b.name));

    let skip = match &params.continuation_token {
        Some(token) => match ContinuationToken::decode(token, "list_documents", None) {
            Ok(parsed) => parsed.cursor,
            Err(e) => return error_result(format!("INVALID_ARGUMENT: {e}")),
        },
        None => 0,
    };

    let max_tokens = params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let (included, has_more, token_count, next_cursor) =
        paginate_from(entries, skip, max_tokens, |e| e.name.len() / 4 + 8);

    let was_truncated_single_item = included.len() == 1 && token_count > max_tokens;
    let response = ListDocumentsResponse {
        documents: included,
        token_count,
    };

    let mut envelope = Envelope::success(response);
    if was_truncated_single_item {
        envelope = envelope.token_limit_exceeded_but_included();
    } else if has_more {
        let token = ContinuationToken::new("list_documents", None, next_cursor).encode();
        envelope = envelope.with_more(token);
    }

    envelope_result(envelope)
}

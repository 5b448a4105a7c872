//! The `get_status` endpoint: indexing status for one document, or the
//! aggregate across all folders.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use folder_mcp_orchestrator::FolderState;
use folder_mcp_store::DocumentStatus;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::mcp::{AppState, envelope_result, error_result};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct GetStatusParams {
    #[serde(default)]
    pub document_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct GetStatusResponse {
    status: &'static str,
    progress: u8,
    message: String,
    token_count: usize,
}

fn document_progress(status: DocumentStatus) -> (&'static str, u8) {
    match status {
        DocumentStatus::Pending => ("processing", 10),
        DocumentStatus::Parsing => ("processing", 30),
        DocumentStatus::Chunking => ("processing", 50),
        DocumentStatus::Embedding => ("processing", 80),
        DocumentStatus::Ready => ("ready", 100),
        DocumentStatus::Failed => ("error", 0),
    }
}

fn folder_is_settled(state: FolderState) -> bool {
    matches!(state, FolderState::Active | FolderState::Watching)
}

pub async fn handler(state: &AppState, params: &GetStatusParams) -> Result<CallToolResult, McpError> {
    if let Some(document_id) = &params.document_id {
        let Some((_, _, doc)) = state.find_document(document_id).await else {
            return error_result(format!("NOT_FOUND: no document with id '{document_id}'"));
        };
        let (status, progress) = document_progress(doc.status);
        let message = format!("document status: {}", doc.status);
        return envelope_result(Envelope::success(GetStatusResponse {
            status,
            progress,
            message,
            token_count: message_len(&message),
        }));
    }

    let folders = state.orchestrator.list_folders();
    if folders.is_empty() {
        let message = "no folders registered".to_string();
        return envelope_result(Envelope::success(GetStatusResponse {
            status: "ready",
            progress: 100,
            message: message.clone(),
            token_count: message_len(&message),
        }));
    }

    if folders.iter().any(|f| f.state == FolderState::Failed) {
        let message = "one or more folders failed to index".to_string();
        return envelope_result(Envelope::success(GetStatusResponse {
            status: "error",
            progress: 0,
            message: message.clone(),
            token_count: message_len(&message),
        }));
    }

    let settled = folders.iter().filter(|f| folder_is_settled(f.state)).count();
    let total = folders.len();
    let progress = u8::try_from((settled * 100) / total.max(1)).unwrap_or(100);
    let status = if settled == total { "ready" } else { "processing" };
    let message = format!("{settled}/{total} folders active");

    envelope_result(Envelope::success(GetStatusResponse {
        status,
        progress,
        message: message.clone(),
        token_count: message_len(&message),
    }))
}

fn message_len(message: &str) -> usize {
    message.len() / 4 + 1
}

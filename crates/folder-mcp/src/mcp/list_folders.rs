//! The `list_folders` endpoint: the configured folders, by name.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::mcp::{AppState, envelope_result};

#[derive(Debug, Clone, Default, Deserialize, JsonSchema)]
pub struct ListFoldersParams {}

#[derive(Debug, Clone, Serialize)]
struct FolderEntry {
    folder_id: String,
    name: String,
}

#[derive(Debug, Clone, Serialize)]
struct ListFoldersResponse {
    folders: Vec<FolderEntry>,
}

pub async fn handler(
    state: &AppState,
    _params: &ListFoldersParams,
) -> Result<CallToolResult, McpError> {
    let folders = state
        .orchestrator
        .list_folders()
        .into_iter()
        .map(|f| FolderEntry {
            folder_id: f.folder_id,
            name: f.name,
        })
        .collect();

    envelope_result(Envelope::success(ListFoldersResponse { folders }))
}

//! The `get_sheet_data` endpoint: headers/rows for one sheet of a
//! spreadsheet document.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use folder_mcp_parsing::chunking::Location;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::continuation::ContinuationToken;
use crate::envelope::{DEFAULT_MAX_TOKENS, Envelope, paginate_from};
use crate::mcp::{AppState, common_error_message};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSheetDataParams {
    pub document_id: String,
    #[serde(default)]
    pub sheet_name: Option<String>,
    #[serde(default)]
    pub cell_range: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct SheetDataResponse {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
    token_count: usize,
}

/// Splits a chunk's flat text content into comma-separated cell rows. Stands
/// in for structured sheet rows until a real spreadsheet parser is
/// registered; the only format-specific behavior this endpoint actually
/// guarantees today is the CSV `sheet_name` rejection below.
fn rows_from_content(content: &str) -> Vec<Vec<String>> {
    content
        .lines()
        .filter(|line| !line.is_empty())
        .map(|line| line.split(',').map(str::trim).map(str::to_string).collect())
        .collect()
}

pub async fn handler(
    state: &AppState,
    params: &GetSheetDataParams,
) -> Result<CallToolResult, McpError> {
    crate::mcp::envelope_result(envelope_for(state, params).await)
}

async fn envelope_for(state: &AppState, params: &GetSheetDataParams) -> Envelope {
    let is_csv = params.document_id.to_lowercase().ends_with(".csv");

    let Some((_, store, doc)) = state.find_document(&params.document_id).await else {
        return Envelope::error(format!("NOT_FOUND: no document with id '{}'", params.document_id));
    };

    let is_csv = is_csv || doc.path.to_lowercase().ends_with(".csv");
    if is_csv && params.sheet_name.is_some() {
        return Envelope::error("INVALID_ARGUMENT: sheet_name is not valid for a CSV document");
    }

    let chunks = match store.iterate_chunks(&doc.id).await {
        Ok(chunks) => chunks,
        Err(e) => return Envelope::error(common_error_message(e)),
    };

    let matching: Vec<_> = chunks
        .into_iter()
        .filter(|c| match &c.location {
            Location::Sheet { name, range } => {
                let name_ok = params.sheet_name.as_ref().is_none_or(|want| want == name);
                let range_ok = params.cell_range.as_ref().is_none_or(|want| want == range);
                name_ok && range_ok
            }
            _ => false,
        })
        .collect();

    if matching.is_empty() {
        return Envelope::error(format!(
            "NOT_FOUND: document '{}' has no matching sheet data",
            params.document_id
        ));
    }

    let mut all_rows: Vec<Vec<String>> = Vec::new();
    for chunk in &matching {
        all_rows.extend(rows_from_content(&chunk.content));
    }
    let headers = all_rows.first().cloned().unwrap_or_default();
    let body_rows: Vec<Vec<String>> = all_rows.into_iter().skip(1).collect();

    let skip = match &params.continuation_token {
        Some(token) => match ContinuationToken::decode(token, "get_sheet_data", Some(&params.document_id)) {
            Ok(parsed) => parsed.cursor,
            Err(e) => return Envelope::error(format!("INVALID_ARGUMENT: {e}")),
        },
        None => 0,
    };

    let max_tokens = params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let (included, has_more, token_count, next_cursor) = paginate_from(body_rows, skip, max_tokens, |row| {
        row.iter().map(String::len).sum::<usize>() / 4 + 4
    });

    let response = SheetDataResponse {
        headers,
        rows: included.clone(),
        token_count,
    };
    let was_truncated_single_item = included.len() == 1 && token_count > max_tokens;

    let mut envelope = Envelope::success(response);
    if was_truncated_single_item {
        envelope = envelope.token_limit_exceeded_but_included();
    } else if has_more {
        let token = ContinuationToken::new(
            "get_sheet_data",
            Some(params.document_id.clone()),
            next_cursor,
        )
        .encode();
        envelope = envelope.with_more(token);
    }

    envelope
}

#[cfg(test)]
mod tests {
    use folder_mcp_parsing::chunking::{ChunkKind, SemanticMetadata};
    use folder_mcp_store::{Chunk, DocumentStatus, NewDocument};

    use super::*;
    use crate::mcp::test_support::state_with_empty_folder;

    #[tokio::test]
    async fn a_csv_document_rejects_an_explicit_sheet_name() {
        let (state, folder_id, _folder_dir, _state_dir) = state_with_empty_folder().await;
        let store = state.orchestrator.store_for(&folder_id).unwrap();
        let doc = store
            .upsert_document(NewDocument {
                folder_id: folder_id.clone(),
                path: "ledger.csv".to_string(),
                content_hash: "abc".to_string(),
                size: 100,
                mtime: 0,
                status: DocumentStatus::Ready,
            })
            .await
            .unwrap();
        store
            .upsert_chunks(
                &doc.id,
                vec![Chunk {
                    id: "chunk-0".to_string(),
                    document_id: doc.id.clone(),
                    ordinal: 0,
                    content: "a,b\n1,2\n".to_string(),
                    content_hash: "h0".to_string(),
                    token_count: 4,
                    location: Location::Sheet {
                        name: "Sheet1".to_string(),
                        range: "A1:B2".to_string(),
                    },
                    semantic_metadata: SemanticMetadata::default_for(ChunkKind::Table),
                }],
            )
            .await
            .unwrap();

        let params = GetSheetDataParams {
            document_id: doc.id,
            sheet_name: Some("Sheet1".to_string()),
            cell_range: None,
            max_tokens: None,
            continuation_token: None,
        };
        let envelope = envelope_for(&state, &params).await;
        assert_eq!(envelope.status.code, crate::envelope::StatusCode::Error);
        assert!(envelope.status.message.starts_with("INVALID_ARGUMENT"));
    }
}

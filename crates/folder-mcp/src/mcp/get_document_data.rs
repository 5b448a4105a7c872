//! The `get_document_data` endpoint: a document's raw content, its chunks,
//! or its parser-reported metadata.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::continuation::ContinuationToken;
use crate::envelope::{DEFAULT_MAX_TOKENS, Envelope, paginate_from};
use crate::mcp::{AppState, common_error_result, envelope_result, error_result};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetDocumentDataParams {
    pub document_id: String,
    pub format: String,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct RawResponse {
    content: String,
    token_count: usize,
}

#[derive(Debug, Clone, Serialize)]
struct ChunkItem {
    chunk_id: String,
    content: String,
    metadata: folder_mcp_parsing::chunking::SemanticMetadata,
}

#[derive(Debug, Clone, Serialize)]
struct ChunksResponse {
    chunks: Vec<ChunkItem>,
    token_count: usize,
}

#[derive(Debug, Clone, Serialize)]
struct MetadataResponse {
    content_hash: String,
    size: i64,
    mtime: i64,
    status: String,
    token_count: usize,
}

pub async fn handler(
    state: &AppState,
    params: &GetDocumentDataParams,
) -> Result<CallToolResult, McpError> {
    let Some((_, store, doc)) = state.find_document(&params.document_id).await else {
        return error_result(format!("NOT_FOUND: no document with id '{}'", params.document_id));
    };

    let max_tokens = params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);

    match params.format.as_str() {
        "raw" => {
            let chunks = match store.iterate_chunks(&doc.id).await {
                Ok(chunks) => chunks,
                Err(e) => return common_error_result(e),
            };
            let mut ordered = chunks;
            ordered.sort_by_key(|c| c.ordinal);
            let content: String = ordered.iter().map(|c| c.content.as_str()).collect();
            let token_count = content.len() / 4 + 1;
            let was_truncated = token_count > max_tokens && !content.is_empty();

            let mut envelope = Envelope::success(RawResponse {
                content,
                token_count,
            });
            if was_truncated {
                envelope = envelope.token_limit_exceeded_but_included();
            }
            envelope_result(envelope)
        }
        "chunks" => {
            let chunks = match store.iterate_chunks(&doc.id).await {
                Ok(chunks) => chunks,
                Err(e) => return common_error_result(e),
            };
            let mut ordered = chunks;
            ordered.sort_by_key(|c| c.ordinal);
            let items: Vec<ChunkItem> = ordered
                .into_iter()
                .map(|c| ChunkItem {
                    chunk_id: c.id,
                    content: c.content,
                    metadata: c.semantic_metadata,
                })
                .collect();

            let skip = match &params.continuation_token {
                Some(token) => {
                    match ContinuationToken::decode(token, "get_document_data", Some(&params.document_id)) {
                        Ok(parsed) => parsed.cursor,
                        Err(e) => return error_result(format!("INVALID_ARGUMENT: {e}")),
                    }
                }
                None => 0,
            };

            let (included, has_more, token_count, next_cursor) =
                paginate_from(items, skip, max_tokens, |c| c.content.len() / 4 + 8);
            let was_truncated_single_item = included.len() == 1 && token_count > max_tokens;

            let mut envelope = Envelope::success(ChunksResponse {
                chunks: included,
                token_count,
            });
            if was_truncated_single_item {
                envelope = envelope.token_limit_exceeded_but_included();
            } else if has_more {
                let token = ContinuationToken::new(
                    "get_document_data",
                    Some(params.document_id.clone()),
                    next_cursor,
                )
                .encode();
                envelope = envelope.with_more(token);
            }
            envelope_result(envelope)
        }
        "metadata" => {
            let message = format!("{}", doc.status);
            envelope_result(Envelope::success(MetadataResponse {
                content_hash: doc.content_hash,
                size: doc.size,
                mtime: doc.mtime,
                status: message,
                token_count: 8,
            }))
        }
        other => error_result(format!("INVALID_ARGUMENT: unknown format '{other}'")),
    }
}

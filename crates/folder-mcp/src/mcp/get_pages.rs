//! The `get_pages` endpoint: content for the requested pages of a paginated
//! document.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use folder_mcp_parsing::chunking::Location;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::continuation::ContinuationToken;
use crate::envelope::{DEFAULT_MAX_TOKENS, Envelope, paginate_from};
use crate::mcp::cellrange::parse_number_selector;
use crate::mcp::{AppState, common_error_message};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetPagesParams {
    pub document_id: String,
    #[serde(default)]
    pub page_range: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct PageItem {
    page_number: usize,
    content: String,
}

#[derive(Debug, Clone, Serialize)]
struct PagesResponse {
    pages: Vec<PageItem>,
    total_pages: usize,
    token_count: usize,
}

pub async fn handler(state: &AppState, params: &GetPagesParams) -> Result<CallToolResult, McpError> {
    crate::mcp::envelope_result(envelope_for(state, params).await)
}

async fn envelope_for(state: &AppState, params: &GetPagesParams) -> Envelope {
    let wanted = match &params.page_range {
        Some(selector) => match parse_number_selector(selector) {
            Some(numbers) => Some(numbers),
            None => {
                return Envelope::error(format!(
                    "INVALID_ARGUMENT: malformed page_range selector '{selector}'"
                ));
            }
        },
        None => None,
    };

    let Some((_, store, doc)) = state.find_document(&params.document_id).await else {
        return Envelope::error(format!("NOT_FOUND: no document with id '{}'", params.document_id));
    };

    let chunks = match store.iterate_chunks(&doc.id).await {
        Ok(chunks) => chunks,
        Err(e) => return Envelope::error(common_error_message(e)),
    };

    let mut pages: Vec<PageItem> = chunks
        .into_iter()
        .filter_map(|c| match c.location {
            Location::Page { number } => Some(PageItem {
                page_number: number,
                content: c.content,
            }),
            _ => None,
        })
        .collect();
    pages.sort_by_key(|p| p.page_number);

    let total_pages = pages.len();
    if total_pages == 0 {
        return Envelope::error(format!(
            "NOT_FOUND: document '{}' has no page content",
            params.document_id
        ));
    }

    if let Some(numbers) = wanted {
        pages.retain(|p| numbers.contains(&p.page_number));
    }

    let skip = match &params.continuation_token {
        Some(token) => match ContinuationToken::decode(token, "get_pages", Some(&params.document_id)) {
            Ok(parsed) => parsed.cursor,
            Err(e) => return Envelope::error(format!("INVALID_ARGUMENT: {e}")),
        },
        None => 0,
    };

    let max_tokens = params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let (included, has_more, token_count, next_cursor) =
        paginate_from(pages, skip, max_tokens, |p| p.content.len() / 4 + 8);

    let was_truncated_single_item = included.len() == 1 && token_count > max_tokens;
    let response = PagesResponse {
        pages: included,
        total_pages,
        token_count,
    };

    let mut envelope = Envelope::success(response);
    if was_truncated_single_item {
        envelope = envelope.token_limit_exceeded_but_included();
    } else if has_more {
        let token = ContinuationToken::new(
            "get_pages",
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

    /// Seeds a document with `count` single-page chunks, each carrying
    /// distinct, recognizable content, and returns its document id.
    async fn seed_paginated_document(
        state: &AppState,
        folder_id: &str,
        count: usize,
    ) -> String {
        let store = state.orchestrator.store_for(folder_id).unwrap();
        let doc = store
            .upsert_document(NewDocument {
                folder_id: folder_id.to_string(),
                path: "report.pdf".to_string(),
                content_hash: "deadbeef".to_string(),
                size: 1024,
                mtime: 0,
                status: DocumentStatus::Ready,
            })
            .await
            .unwrap();

        let chunks = (0..count)
            .map(|i| Chunk {
                id: format!("chunk-{i}"),
                document_id: doc.id.clone(),
                ordinal: i,
                content: format!("this is the text of page {i}"),
                content_hash: format!("hash-{i}"),
                token_count: 8,
                location: Location::Page { number: i + 1 },
                semantic_metadata: SemanticMetadata::default_for(ChunkKind::Prose),
            })
            .collect();
        store.upsert_chunks(&doc.id, chunks).await.unwrap();

        doc.id
    }

    #[tokio::test]
    async fn feeding_the_continuation_token_back_resumes_the_next_page_range() {
        let (state, folder_id, _folder_dir, _state_dir) = state_with_empty_folder().await;
        let document_id = seed_paginated_document(&state, &folder_id, 100).await;

        let mut seen_page_numbers = Vec::new();
        let mut continuation_token = None;

        loop {
            let params = GetPagesParams {
                document_id: document_id.clone(),
                page_range: None,
                max_tokens: Some(500),
                continuation_token: continuation_token.clone(),
            };
            let envelope = envelope_for(&state, &params).await;
            assert_eq!(envelope.status.code, crate::envelope::StatusCode::Success);

            let pages = envelope.data["pages"].as_array().cloned().unwrap_or_default();
            assert!(!pages.is_empty(), "every page should make progress");
            for page in &pages {
                seen_page_numbers.push(page["page_number"].as_u64().unwrap());
            }

            if !envelope.continuation.has_more {
                break;
            }
            continuation_token = envelope.continuation.token.clone();
            assert!(continuation_token.is_some());
        }

        let expected: Vec<u64> = (1..=100).collect();
        assert_eq!(seen_page_numbers, expected);
    }

    #[tokio::test]
    async fn a_document_with_no_page_content_is_not_found() {
        let (state, folder_id, _folder_dir, _state_dir) = state_with_empty_folder().await;
        let store = state.orchestrator.store_for(&folder_id).unwrap();
        let doc = store
            .upsert_document(NewDocument {
                folder_id: folder_id.clone(),
                path: "notes.txt".to_string(),
                content_hash: "abc".to_string(),
                size: 10,
                mtime: 0,
                status: DocumentStatus::Ready,
            })
            .await
            .unwrap();

        let params = GetPagesParams {
            document_id: doc.id,
            page_range: None,
            max_tokens: None,
            continuation_token: None,
        };
        let envelope = envelope_for(&state, &params).await;
        assert_eq!(envelope.status.code, crate::envelope::StatusCode::Error);
    }
}

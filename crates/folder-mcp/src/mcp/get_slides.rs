//! The `get_slides` endpoint: content and notes for the requested slides of
//! a presentation document.

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use folder_mcp_parsing::chunking::Location;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::continuation::ContinuationToken;
use crate::envelope::{DEFAULT_MAX_TOKENS, Envelope, paginate_from};
use crate::mcp::cellrange::parse_number_selector;
use crate::mcp::{AppState, common_error_result, envelope_result, error_result};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetSlidesParams {
    pub document_id: String,
    #[serde(default)]
    pub slide_numbers: Option<String>,
    #[serde(default)]
    pub max_tokens: Option<usize>,
    #[serde(default)]
    pub continuation_token: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
struct SlideItem {
    slide_number: usize,
    title: String,
    content: String,
    notes: String,
}

#[derive(Debug, Clone, Serialize)]
struct SlidesResponse {
    slides: Vec<SlideItem>,
    total_slides: usize,
    token_count: usize,
}

pub async fn handler(state: &AppState, params: &GetSlidesParams) -> Result<CallToolResult, McpError> {
    let wanted = match &params.slide_numbers {
        Some(selector) => match parse_number_selector(selector) {
            Some(numbers) => Some(numbers),
            None => {
                return error_result(format!(
                    "INVALID_ARGUMENT: malformed slide_numbers selector '{selector}'"
                ));
            }
        },
        None => None,
    };

    let Some((_, store, doc)) = state.find_document(&params.document_id).await else {
        return error_result(format!("NOT_FOUND: no document with id '{}'", params.document_id));
    };

    let chunks = match store.iterate_chunks(&doc.id).await {
        Ok(chunks) => chunks,
        Err(e) => return common_error_result(e),
    };

    let mut slides: Vec<SlideItem> = chunks
        .into_iter()
        .filter_map(|c| match c.location {
            Location::Slide { number } => Some(SlideItem {
                slide_number: number,
                title: c.semantic_metadata.heading_context.clone().unwrap_or_default(),
                content: c.content,
                notes: String::new(),
            }),
            _ => None,
        })
        .collect();
    slides.sort_by_key(|s| s.slide_number);

    let total_slides = slides.len();
    if total_slides == 0 {
        return error_result(format!(
            "NOT_FOUND: document '{}' has no slide content",
            params.document_id
        ));
    }

    if let Some(numbers) = wanted {
        slides.retain(|s| numbers.contains(&s.slide_number));
    }

    let skip = match &params.continuation_token {
        Some(token) => match ContinuationToken::decode(token, "get_slides", Some(&params.document_id)) {
            Ok(parsed) => parsed.cursor,
            Err(e) => return error_result(format!("INVALID_ARGUMENT: {e}")),
        },
        None => 0,
    };

    let max_tokens = params.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS);
    let (included, has_more, token_count, next_cursor) =
        paginate_from(slides, skip, max_tokens, |s| s.content.len() / 4 + 8);

    let was_truncated_single_item = included.len() == 1 && token_count > max_tokens;
    let response = SlidesResponse {
        slides: included,
        total_slides,
        token_count,
    };

    let mut envelope = Envelope::success(response);
    if was_truncated_single_item {
        envelope = envelope.token_limit_exceeded_but_included();
    } else if has_more {
        let token = ContinuationToken::new(
            "get_slides",
            Some(params.document_id.clone()),
            next_cursor,
        )
        .encode();
        envelope = envelope.with_more(token);
    }

    envelope_result(envelope)
}

//! The `get_document_outline` endpoint: a type-tagged summary of a
//! document's navigable structure, shaped by whichever `Location` variant
//! its chunks actually carry.

use std::collections::BTreeMap;

use agenterra_rmcp::Error as McpError;
use agenterra_rmcp::model::CallToolResult;
use folder_mcp_parsing::chunking::Location;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::mcp::cellrange::parse_cell_range;
use crate::mcp::{AppState, common_error_result, envelope_result, error_result};

#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct GetDocumentOutlineParams {
    pub document_id: String,
}

#[derive(Debug, Clone, Serialize)]
struct SheetOutline {
    name: String,
    rows: usize,
    columns: usize,
}

#[derive(Debug, Clone, Serialize)]
struct SlideOutline {
    number: usize,
    title: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum OutlineBody {
    Pdf {
        total_pages: usize,
        bookmarks: Vec<String>,
        file_size: i64,
    },
    Xlsx {
        sheets: Vec<SheetOutline>,
        total_rows: usize,
        file_size: i64,
    },
    Pptx {
        total_slides: usize,
        slides: Vec<SlideOutline>,
        file_size: i64,
    },
    Text {
        lines: usize,
        file_size: i64,
    },
}

pub async fn handler(
    state: &AppState,
    params: &GetDocumentOutlineParams,
) -> Result<CallToolResult, McpError> {
    let Some((_, store, doc)) = state.find_document(&params.document_id).await else {
        return error_result(format!("NOT_FOUND: no document with id '{}'", params.document_id));
    };

    let chunks = match store.iterate_chunks(&doc.id).await {
        Ok(chunks) => chunks,
        Err(e) => return common_error_result(e),
    };

    let body = if chunks.iter().any(|c| matches!(c.location, Location::Page { .. })) {
        let total_pages = chunks
            .iter()
            .filter_map(|c| match &c.location {
                Location::Page { number } => Some(*number),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        OutlineBody::Pdf {
            total_pages,
            bookmarks: Vec::new(),
            file_size: doc.size,
        }
    } else if chunks.iter().any(|c| matches!(c.location, Location::Sheet { .. })) {
        let mut by_sheet: BTreeMap<String, (usize, usize)> = BTreeMap::new();
        for chunk in &chunks {
            if let Location::Sheet { name, range } = &chunk.location {
                let (rows, columns) = parse_cell_range(range).unwrap_or((0, 0));
                let entry = by_sheet.entry(name.clone()).or_insert((0, 0));
                entry.0 = entry.0.max(rows);
                entry.1 = entry.1.max(columns);
            }
        }
        let total_rows = by_sheet.values().map(|(rows, _)| rows).sum();
        let sheets = by_sheet
            .into_iter()
            .map(|(name, (rows, columns))| SheetOutline { name, rows, columns })
            .collect();
        OutlineBody::Xlsx {
            sheets,
            total_rows,
            file_size: doc.size,
        }
    } else if chunks.iter().any(|c| matches!(c.location, Location::Slide { .. })) {
        let mut slides: Vec<SlideOutline> = chunks
            .iter()
            .filter_map(|c| match &c.location {
                Location::Slide { number } => Some(SlideOutline {
                    number: *number,
                    title: c
                        .semantic_metadata
                        .heading_context
                        .clone()
                        .unwrap_or_default(),
                }),
                _ => None,
            })
            .collect();
        slides.sort_by_key(|s| s.number);
        slides.dedup_by_key(|s| s.number);
        OutlineBody::Pptx {
            total_slides: slides.len(),
            slides,
            file_size: doc.size,
        }
    } else {
        let lines = chunks
            .iter()
            .filter_map(|c| match &c.location {
                Location::Lines { end, .. } => Some(*end),
                _ => None,
            })
            .max()
            .unwrap_or(0);
        OutlineBody::Text {
            lines,
            file_size: doc.size,
        }
    };

    envelope_result(Envelope::success(body))
}

//! Chunk output types shared by the chunker and, downstream, the store.

use serde::{Deserialize, Serialize};

/// Where a chunk sits within its parent document, shaped by the document's
/// `ParsedDocument` variant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    /// A page within a paginated document (PDF-like).
    Page {
        /// 1-indexed page number.
        number: usize,
    },
    /// A slide within a presentation deck.
    Slide {
        /// 1-indexed slide number.
        number: usize,
    },
    /// A cell range within a spreadsheet sheet.
    Sheet {
        /// Sheet name.
        name: String,
        /// Cell range, e.g. `"A1:C12"`.
        range: String,
    },
    /// A line range within flat text content.
    Lines {
        /// 1-indexed inclusive start line.
        start: usize,
        /// 1-indexed inclusive end line.
        end: usize,
    },
}

/// The kind of content a chunk carries, used to pick a rendering/ranking
/// strategy downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChunkKind {
    /// Natural-language prose.
    Prose,
    /// Source code.
    Code,
    /// Tabular data.
    Table,
}

/// Semantic context attached to every chunk. A default builder is always
/// available so no chunk ever carries null metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticMetadata {
    /// Heading/section path leading to this chunk, outermost first.
    #[serde(default)]
    pub section_path: Vec<String>,
    /// Nearest enclosing heading text, if any.
    #[serde(default)]
    pub heading_context: Option<String>,
    /// Programming or natural language of the content, if known.
    #[serde(default)]
    pub language: Option<String>,
    /// What kind of content this chunk holds.
    pub kind: ChunkKind,
}

impl SemanticMetadata {
    /// The metadata every chunk gets when no richer context is available.
    #[must_use]
    pub fn default_for(kind: ChunkKind) -> Self {
        Self {
            section_path: Vec::new(),
            heading_context: None,
            language: None,
            kind,
        }
    }
}

/// One chunk produced by the [`ChunkingService`], before it is assigned a
/// stable [`ChunkId`] and persisted.
///
/// [`ChunkingService`]: crate::chunking::ChunkingService
/// [`ChunkId`]: folder_mcp_common
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkDraft {
    /// Dense, monotonically increasing position within the document.
    pub ordinal: usize,
    /// Raw chunk text, an exact substring of the parsed document content.
    pub content: String,
    /// Hash of the NFC-normalized, trailing-whitespace-stripped content.
    pub content_hash: String,
    /// Approximate token count under the model the caller requested.
    pub token_count: usize,
    /// Where this chunk sits in the parent document.
    pub location: Location,
    /// Semantic context for this chunk.
    pub semantic_metadata: SemanticMetadata,
}

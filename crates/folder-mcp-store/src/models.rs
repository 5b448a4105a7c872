//! Domain models persisted by the embedding store.

use folder_mcp_parsing::chunking::{ChunkDraft, Location, SemanticMetadata};
use serde::{Deserialize, Serialize};

/// Where a [`Document`] is in the indexing lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStatus {
    Pending,
    Parsing,
    Chunking,
    Embedding,
    Ready,
    Failed,
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "parsing" => Ok(Self::Parsing),
            "chunking" => Ok(Self::Chunking),
            "embedding" => Ok(Self::Embedding),
            "ready" => Ok(Self::Ready),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown document status: {other}")),
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Pending => "pending",
            Self::Parsing => "parsing",
            Self::Chunking => "chunking",
            Self::Embedding => "embedding",
            Self::Ready => "ready",
            Self::Failed => "failed",
        };
        write!(f, "{s}")
    }
}

/// One parsed file belonging to exactly one folder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable id, derived from `(folder_id, path)`.
    pub id: String,
    pub folder_id: String,
    /// Canonical path relative to the folder root.
    pub path: String,
    /// Hash of the raw file bytes.
    pub content_hash: String,
    pub size: i64,
    pub mtime: i64,
    pub status: DocumentStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A document row queued for creation or replacement.
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub folder_id: String,
    pub path: String,
    pub content_hash: String,
    pub size: i64,
    pub mtime: i64,
    pub status: DocumentStatus,
}

/// A persisted chunk, as stored (location/semantic metadata deserialized).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub ordinal: usize,
    pub content: String,
    pub content_hash: String,
    pub token_count: usize,
    pub location: Location,
    pub semantic_metadata: SemanticMetadata,
}

impl Chunk {
    /// Build the row that will be persisted for a draft produced by the chunker.
    #[must_use]
    pub fn from_draft(id: String, document_id: String, draft: ChunkDraft) -> Self {
        Self {
            id,
            document_id,
            ordinal: draft.ordinal,
            content: draft.content,
            content_hash: draft.content_hash,
            token_count: draft.token_count,
            location: draft.location,
            semantic_metadata: draft.semantic_metadata,
        }
    }
}

/// A fixed-dimension vector bound 1:1 to a chunk.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub chunk_id: String,
    pub model: String,
    pub dimension: usize,
    pub vector: Vec<f32>,
}

/// Per-folder bookkeeping: snapshot version, last scan, schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderMeta {
    pub snapshot_version: i64,
    pub last_scan_time: Option<i64>,
    pub schema_version: i64,
}

impl Default for FolderMeta {
    fn default() -> Self {
        Self {
            snapshot_version: 0,
            last_scan_time: None,
            schema_version: 1,
        }
    }
}

/// One row of a similarity search result.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub chunk_id: String,
    pub document_id: String,
    pub score: f32,
    pub location: Location,
    /// A short excerpt of the chunk's content, for result previews.
    pub preview: String,
}

/// Filters narrowing a similarity search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilters {
    pub folder_id: Option<String>,
    pub document_id: Option<String>,
}

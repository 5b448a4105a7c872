//! Per-folder event stream.

use serde::Serialize;

/// Progress snapshot emitted during active indexing work.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ProgressSnapshot {
    pub total_files: usize,
    pub processed_files: usize,
    pub total_chunks: usize,
    pub processed_chunks: usize,
    pub percentage: f32,
}

impl ProgressSnapshot {
    #[must_use]
    pub fn new(total_files: usize, processed_files: usize, total_chunks: usize, processed_chunks: usize) -> Self {
        #[allow(clippy::cast_precision_loss)]
        let percentage = if total_files == 0 {
            100.0
        } else {
            (processed_files as f32 / total_files as f32) * 100.0
        };
        Self {
            total_files,
            processed_files,
            total_chunks,
            processed_chunks,
            percentage,
        }
    }
}

/// Events delivered, per folder, in order to subscribers. No ordering is
/// guaranteed across different folders.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FolderEvent {
    Added,
    IndexingStarted,
    Progress(ProgressSnapshot),
    IndexingComplete,
    Error { message: String },
    Removed,
}

/// Per-folder broadcast capacity. Generous enough that a slow subscriber
/// doesn't drop events under normal indexing bursts.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

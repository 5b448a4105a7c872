//! Scanning a folder tree and diffing it against the store's last-known
//! state to produce a [`ChangeSet`].

use crate::error::OrchestratorResult;
use folder_mcp_store::Document;
use ignore::WalkBuilder;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// One file observed on disk during a scan, relative to the folder root.
#[derive(Debug, Clone)]
pub struct ScannedFile {
    pub relative_path: String,
    pub content_hash: String,
    pub size: u64,
    pub mtime: i64,
}

/// Enumerate every regular file under `root`, honoring `.gitignore`-style
/// include/exclude rules via `ignore::WalkBuilder`.
///
/// # Errors
///
/// Returns an error if a directory entry can't be read.
pub fn scan(root: &Path) -> OrchestratorResult<Vec<ScannedFile>> {
    let mut files = Vec::new();

    for entry in WalkBuilder::new(root).hidden(false).build() {
        let entry = entry?;
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let bytes = fs::read(path)?;
        let metadata = fs::metadata(path)?;
        let mtime = metadata
            .modified()
            .ok()
            .and_then(|t| t.duration_since(std::time::UNIX_EPOCH).ok())
            .map_or(0, |d| i64::try_from(d.as_secs()).unwrap_or(i64::MAX));

        files.push(ScannedFile {
            relative_path: relative.to_string_lossy().replace('\\', "/"),
            content_hash: folder_mcp_common::content_hash(&bytes),
            size: metadata.len(),
            mtime,
        });
    }

    Ok(files)
}

/// New/modified/deleted/unchanged paths between the last persisted snapshot
/// and a fresh scan.
#[derive(Debug, Clone, Default)]
pub struct ChangeSet {
    pub new: Vec<ScannedFile>,
    pub modified: Vec<ScannedFile>,
    pub deleted: Vec<String>,
    pub unchanged: Vec<String>,
}

impl ChangeSet {
    /// Summary counts, for progress reporting and the "full reindex" heuristic.
    #[must_use]
    pub fn summary(&self) -> ChangeSummary {
        let total_changes = self.new.len() + self.modified.len() + self.deleted.len();
        ChangeSummary {
            total_changes,
            estimated_cost: self.new.len() + self.modified.len(),
            requires_full_reindex: self.unchanged.is_empty() && total_changes > 0,
        }
    }
}

/// Cheap summary of a [`ChangeSet`], exposed ahead of actually indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChangeSummary {
    pub total_changes: usize,
    pub estimated_cost: usize,
    pub requires_full_reindex: bool,
}

/// Diff a fresh scan against the documents already recorded in the store.
#[must_use]
pub fn diff(scanned: Vec<ScannedFile>, existing: &[Document]) -> ChangeSet {
    let mut existing_by_path: HashMap<&str, &Document> =
        existing.iter().map(|d| (d.path.as_str(), d)).collect();

    let mut change_set = ChangeSet::default();

    for file in scanned {
        match existing_by_path.remove(file.relative_path.as_str()) {
            None => change_set.new.push(file),
            Some(doc) if doc.content_hash == file.content_hash => {
                change_set.unchanged.push(file.relative_path);
            }
            Some(_) => change_set.modified.push(file),
        }
    }

    change_set.deleted = existing_by_path.keys().map(|p| (*p).to_string()).collect();
    change_set
}

#[cfg(test)]
mod tests {
    use super::*;
    use folder_mcp_store::DocumentStatus;

    fn doc(path: &str, hash: &str) -> Document {
        Document {
            id: "id".into(),
            folder_id: "f1".into(),
            path: path.into(),
            content_hash: hash.into(),
            size: 1,
            mtime: 1,
            status: DocumentStatus::Ready,
            created_at: 0,
            updated_at: 0,
        }
    }

    fn scanned(path: &str, hash: &str) -> ScannedFile {
        ScannedFile {
            relative_path: path.into(),
            content_hash: hash.into(),
            size: 1,
            mtime: 1,
        }
    }

    #[test]
    fn classifies_new_modified_deleted_unchanged() {
        let existing = vec![doc("a.txt", "h1"), doc("b.txt", "h2"), doc("c.txt", "h3")];
        let scan_result = vec![
            scanned("a.txt", "h1"),       // unchanged
            scanned("b.txt", "h2-new"),   // modified
            scanned("d.txt", "h4"),       // new
            // c.txt missing -> deleted
        ];

        let change_set = diff(scan_result, &existing);
        assert_eq!(change_set.unchanged, vec!["a.txt"]);
        assert_eq!(change_set.modified.len(), 1);
        assert_eq!(change_set.modified[0].relative_path, "b.txt");
        assert_eq!(change_set.new.len(), 1);
        assert_eq!(change_set.new[0].relative_path, "d.txt");
        assert_eq!(change_set.deleted, vec!["c.txt".to_string()]);
    }

    #[test]
    fn empty_scan_against_empty_store_has_no_changes() {
        let change_set = diff(Vec::new(), &[]);
        assert_eq!(change_set.summary().total_changes, 0);
    }
}

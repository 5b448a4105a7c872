//! Deterministic id generation for documents and chunks.
//!
//! Both ids are derived rather than random so re-running the indexing
//! pipeline over an unchanged filesystem produces the same rows instead of
//! duplicates.

use uuid::{Uuid, uuid};

const FOLDER_MCP_NAMESPACE: Uuid = uuid!("6f6e7e9a-2b3d-4c1a-9f0e-7c2a5d8b1f4e");

/// Stable document id: a hash of `(folder_id, path)`.
#[must_use]
pub fn document_id(folder_id: &str, path: &str) -> String {
    let data = format!("{folder_id}:{path}");
    Uuid::new_v5(&FOLDER_MCP_NAMESPACE, data.as_bytes()).to_string()
}

/// Stable chunk id: a hash of `(document_id, ordinal)`.
///
/// Keyed on ordinal rather than byte range so content hash is free to differ
/// on updates and still replace the same logical chunk.
#[must_use]
pub fn chunk_id(document_id: &str, ordinal: usize) -> String {
    let data = format!("{document_id}:{ordinal}");
    Uuid::new_v5(&FOLDER_MCP_NAMESPACE, data.as_bytes()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_id_is_deterministic() {
        assert_eq!(document_id("f1", "a/b.txt"), document_id("f1", "a/b.txt"));
    }

    #[test]
    fn document_id_differs_per_path() {
        assert_ne!(document_id("f1", "a/b.txt"), document_id("f1", "a/c.txt"));
    }

    #[test]
    fn chunk_id_differs_per_ordinal() {
        let doc = document_id("f1", "a/b.txt");
        assert_ne!(chunk_id(&doc, 0), chunk_id(&doc, 1));
    }
}

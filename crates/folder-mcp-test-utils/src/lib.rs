//! Shared test fixtures for folder-mcp crates: temp folder builders, a
//! cross-crate unique-id counter, and a default deterministic embedding
//! service for tests that don't care about real model output.

use folder_mcp_config::{FolderConfig, FolderEmbeddingsConfig};
use folder_mcp_embeddings::{DefaultEmbeddingProvider, DefaultEmbeddingService, EmbeddingService};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Global counter for unique folder/document names across test crates,
/// avoiding id collisions when tests run in parallel.
static TEST_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Next unique id, monotonically increasing across the whole test binary.
pub fn next_test_id() -> usize {
    TEST_COUNTER.fetch_add(1, Ordering::SeqCst)
}

/// Write `files` (relative path, content) under a fresh temp directory.
///
/// # Panics
///
/// Panics if the temp directory or any file/parent directory can't be
/// created — acceptable for test setup code.
#[must_use]
pub fn write_temp_folder(files: &[(&str, &str)]) -> tempfile::TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    for (relative_path, content) in files {
        let path = dir.path().join(relative_path);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent dir");
        }
        std::fs::write(&path, content).expect("write temp file");
    }
    dir
}

/// A [`FolderConfig`] pointing at `path`, enabled, with the default
/// embeddings backend/model.
#[must_use]
pub fn folder_config(path: &Path, name: &str) -> FolderConfig {
    FolderConfig {
        path: path.to_path_buf(),
        name: name.to_string(),
        enabled: true,
        embeddings: FolderEmbeddingsConfig::default(),
    }
}

/// A deterministic embedding service for tests: 32-dimension vectors, no
/// model runtime, unbounded concurrency.
#[must_use]
pub fn mock_embedding_service() -> Arc<dyn EmbeddingService> {
    let provider = DefaultEmbeddingProvider::new("test-embedding-model", 32, 8192, 8);
    Arc::new(DefaultEmbeddingService::new(Arc::new(provider), 32))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_increments_monotonically() {
        let a = next_test_id();
        let b = next_test_id();
        assert_eq!(b, a + 1);
    }

    #[test]
    fn write_temp_folder_creates_nested_files() {
        let dir = write_temp_folder(&[("a.txt", "hello"), ("sub/b.md", "# title")]);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.txt")).unwrap(), "hello");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("sub/b.md")).unwrap(),
            "# title"
        );
    }

    #[tokio::test]
    async fn mock_embedding_service_produces_dimension_32() {
        let service = mock_embedding_service();
        let vectors = service.generate_embeddings(vec!["hello"]).await.unwrap();
        assert_eq!(vectors[0].len(), 32);
    }
}

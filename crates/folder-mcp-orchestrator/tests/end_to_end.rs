//! End-to-end orchestrator scenarios: register a folder, watch it reach
//! `Active`, mutate it, remove it, and check status aggregation along the way.

use std::sync::Arc;
use std::time::Duration;

use folder_mcp_config::ChunkingConfig;
use folder_mcp_orchestrator::{FolderOrchestrator, FolderState};
use folder_mcp_parsing::{ChunkingService, ParserRegistry, PlainTextParser, TokenBudget};
use folder_mcp_parsing::chunking::TokenCounterRegistry;
use folder_mcp_test_utils::{folder_config, mock_embedding_service, write_temp_folder};

fn build_orchestrator(state_dir: &std::path::Path) -> FolderOrchestrator {
    let mut registry = ParserRegistry::new();
    registry.register(Box::new(PlainTextParser::new()));
    let parser_registry = Arc::new(registry);

    let counter = TokenCounterRegistry::new().default_counter();
    let chunking_config = ChunkingConfig::default();
    let budget = TokenBudget::new(
        chunking_config.target_tokens,
        chunking_config.soft_cap_multiplier,
        chunking_config.hard_cap_multiplier,
    );
    let chunking_service = Arc::new(ChunkingService::new(counter, budget));

    FolderOrchestrator::new(
        4,
        parser_registry,
        chunking_service,
        mock_embedding_service(),
        &chunking_config,
        state_dir.to_path_buf(),
        Duration::from_millis(20),
    )
}

async fn wait_for_state(
    orchestrator: &FolderOrchestrator,
    folder_id: &str,
    target: FolderState,
    timeout: Duration,
) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        let reached = orchestrator
            .list_folders()
            .into_iter()
            .any(|f| f.folder_id == folder_id && f.state == target);
        if reached {
            return true;
        }
        if tokio::time::Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

/// Scenario 1: add and index a small folder.
#[tokio::test]
async fn add_and_index_a_small_folder() {
    let dir = write_temp_folder(&[("a.txt", "Hello world"), ("b.md", "# Title\nbody")]);
    let state_dir = tempfile::tempdir().unwrap();
    let orchestrator = build_orchestrator(state_dir.path());

    let folder_id = orchestrator
        .add_folder(folder_config(dir.path(), "scenario-1"))
        .await
        .unwrap();

    assert!(wait_for_state(&orchestrator, &folder_id, FolderState::Active, Duration::from_secs(10)).await);

    let store = orchestrator.store_for(&folder_id).unwrap();
    let documents = store.list_documents(&folder_id).await.unwrap();
    assert_eq!(documents.len(), 2);
}

/// Scenario 2: modifying a file replaces its chunks without touching siblings.
#[tokio::test]
async fn incremental_modification_preserves_sibling_chunks() {
    let dir = write_temp_folder(&[("a.txt", "Hello world"), ("b.md", "# Title\nbody")]);
    let state_dir = tempfile::tempdir().unwrap();
    let orchestrator = build_orchestrator(state_dir.path());

    let folder_id = orchestrator
        .add_folder(folder_config(dir.path(), "scenario-2"))
        .await
        .unwrap();
    assert!(wait_for_state(&orchestrator, &folder_id, FolderState::Active, Duration::from_secs(10)).await);

    let store = orchestrator.store_for(&folder_id).unwrap();
    let before = store.list_documents(&folder_id).await.unwrap();
    let b_before = before.iter().find(|d| d.path.ends_with("b.md")).unwrap().clone();
    let b_chunks_before = store.iterate_chunks(&b_before.id).await.unwrap();

    std::fs::write(dir.path().join("a.txt"), "Hello Go").unwrap();
    orchestrator.reload_folder(&folder_id).await.unwrap();

    let after = store.list_documents(&folder_id).await.unwrap();
    let a_after = after.iter().find(|d| d.path.ends_with("a.txt")).unwrap();
    let a_chunks = store.iterate_chunks(&a_after.id).await.unwrap();
    let content: String = a_chunks.iter().map(|c| c.content.as_str()).collect();
    assert_eq!(content, "Hello Go");

    let b_after = after.iter().find(|d| d.path.ends_with("b.md")).unwrap();
    let b_chunks_after = store.iterate_chunks(&b_after.id).await.unwrap();
    let before_ids: Vec<_> = b_chunks_before.iter().map(|c| c.id.clone()).collect();
    let after_ids: Vec<_> = b_chunks_after.iter().map(|c| c.id.clone()).collect();
    assert_eq!(before_ids, after_ids);
}

/// Scenario 4: removing a folder tears down its store and directory.
#[tokio::test]
async fn removing_a_folder_cleans_up_its_state_directory() {
    let dir = write_temp_folder(&[("a.txt", "content")]);
    let state_dir = tempfile::tempdir().unwrap();
    let orchestrator = build_orchestrator(state_dir.path());

    let folder_id = orchestrator
        .add_folder(folder_config(dir.path(), "scenario-4"))
        .await
        .unwrap();
    assert!(wait_for_state(&orchestrator, &folder_id, FolderState::Active, Duration::from_secs(10)).await);

    orchestrator.remove_folder(&folder_id).await.unwrap();

    assert!(orchestrator.list_folders().is_empty());
    assert!(orchestrator.store_for(&folder_id).is_err());
}

/// Scenario 6: status aggregation never reports a higher-than-true fraction
/// of settled folders, and a failed folder always reports `error`.
#[tokio::test]
async fn aggregate_status_reflects_settled_folder_count() {
    let dir_a = write_temp_folder(&[("a.txt", "one")]);
    let dir_b = write_temp_folder(&[("b.txt", "two")]);
    let state_dir = tempfile::tempdir().unwrap();
    let orchestrator = build_orchestrator(state_dir.path());

    let id_a = orchestrator.add_folder(folder_config(dir_a.path(), "a")).await.unwrap();
    let id_b = orchestrator.add_folder(folder_config(dir_b.path(), "b")).await.unwrap();

    assert!(wait_for_state(&orchestrator, &id_a, FolderState::Active, Duration::from_secs(10)).await);
    assert!(wait_for_state(&orchestrator, &id_b, FolderState::Active, Duration::from_secs(10)).await);

    let folders = orchestrator.list_folders();
    let settled = folders.iter().filter(|f| matches!(f.state, FolderState::Active | FolderState::Watching)).count();
    assert_eq!(settled, folders.len());
}

//! Background health monitor: periodically logs folder lifecycle state and
//! verifies each folder's store is still reachable.

use std::sync::Arc;
use std::time::Duration;

use folder_mcp_orchestrator::{FolderOrchestrator, FolderState};
use tracing::{info, warn};

/// Runs until cancelled (the caller aborts the returned `JoinHandle`).
pub async fn run_health_monitor(orchestrator: Arc<FolderOrchestrator>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        ticker.tick().await;
        check_once(&orchestrator).await;
    }
}

async fn check_once(orchestrator: &FolderOrchestrator) {
    let folders = orchestrator.list_folders();
    let failed: Vec<_> = folders.iter().filter(|f| f.state == FolderState::Failed).collect();
    if !failed.is_empty() {
        warn!(count = failed.len(), "folders in failed state");
    }

    for (folder_id, store) in orchestrator.all_stores() {
        if let Err(e) = store.get_folder_meta(&folder_id).await {
            warn!(folder_id, error = ?e, "store health check failed");
        }
    }

    if let Some(rss_kb) = resident_memory_kb() {
        info!(rss_kb, folders = folders.len(), "health check");
    } else {
        info!(folders = folders.len(), "health check");
    }
}

#[cfg(target_os = "linux")]
fn resident_memory_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status.lines().find_map(|line| {
        let rest = line.strip_prefix("VmRSS:")?;
        rest.trim().split_whitespace().next()?.parse().ok()
    })
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_kb() -> Option<u64> {
    None
}

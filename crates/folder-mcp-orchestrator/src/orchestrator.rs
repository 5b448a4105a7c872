//! Owns every monitored folder: registration, lifecycle driving, and the
//! concurrency bound on simultaneous indexing work.

use crate::detect::{self, ChangeSet};
use crate::error::{OrchestratorError, OrchestratorResult};
use crate::events::{EVENT_CHANNEL_CAPACITY, FolderEvent};
use crate::lifecycle::{FolderLifecycle, FolderState, LifecycleCommand};
use crate::pipeline::{Pipeline, PipelineConfig};
use dashmap::DashMap;
use folder_mcp_config::{ChunkingConfig, FolderConfig};
use folder_mcp_embeddings::EmbeddingService;
use folder_mcp_parsing::{ChunkingService, ParserRegistry};
use folder_mcp_store::EmbeddingStore;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Semaphore, broadcast, mpsc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use uuid::{Uuid, uuid};

const FOLDER_ID_NAMESPACE: Uuid = uuid!("3f8a6d2e-9c1b-4e5a-8f7d-2b6c4a9e1d03");

/// Derives a stable id for a folder from its canonicalized path, so
/// re-registering the same path across restarts reuses its persisted store.
fn folder_id_for(path: &Path) -> String {
    let canonical = path
        .canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .to_string();
    Uuid::new_v5(&FOLDER_ID_NAMESPACE, canonical.as_bytes()).to_string()
}

/// Public summary of a registered folder, as surfaced by `list_folders`.
#[derive(Debug, Clone)]
pub struct FolderSummary {
    pub folder_id: String,
    pub name: String,
    pub path: PathBuf,
    pub state: FolderState,
}

/// Detailed status of one folder, as surfaced by `get_status`.
#[derive(Debug, Clone)]
pub struct FolderStatus {
    pub folder_id: String,
    pub state: FolderState,
    pub document_count: usize,
}

struct FolderHandle {
    config: FolderConfig,
    lifecycle: Arc<Mutex<FolderLifecycle>>,
    store: Arc<dyn EmbeddingStore>,
    events_tx: broadcast::Sender<FolderEvent>,
    cancel: CancellationToken,
}

/// Coordinates every monitored folder: the lifecycle state machine, the
/// indexing pipeline, and the filesystem watcher, all bounded by one
/// semaphore so indexing work across folders doesn't oversubscribe the host.
pub struct FolderOrchestrator {
    folders: Arc<DashMap<String, FolderHandle>>,
    semaphore: Arc<Semaphore>,
    parser_registry: Arc<ParserRegistry>,
    chunking_service: Arc<ChunkingService>,
    embedding_service: Arc<dyn EmbeddingService>,
    pipeline_config: PipelineConfig,
    state_dir: PathBuf,
    watch_debounce: Duration,
}

impl FolderOrchestrator {
    /// Build an orchestrator. `state_dir` is the root under which each
    /// folder gets its own `<folder_id>/store.db`, mirroring `.folder-mcp/`.
    /// `watch_debounce` is how long a folder's watcher waits after a
    /// filesystem event before re-scanning, coalescing bursts into one cycle.
    #[must_use]
    pub fn new(
        max_concurrent_folders: usize,
        parser_registry: Arc<ParserRegistry>,
        chunking_service: Arc<ChunkingService>,
        embedding_service: Arc<dyn EmbeddingService>,
        chunking_config: &ChunkingConfig,
        state_dir: PathBuf,
        watch_debounce: Duration,
    ) -> Self {
        Self {
            folders: Arc::new(DashMap::new()),
            semaphore: Arc::new(Semaphore::new(max_concurrent_folders.max(1))),
            parser_registry,
            chunking_service,
            embedding_service,
            pipeline_config: pipeline_config_from(chunking_config),
            state_dir,
            watch_debounce,
        }
    }

    /// Register and start monitoring a folder. Idempotent: re-adding a path
    /// already registered returns its existing id without restarting it.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::InvalidFolder`] if `config.path` doesn't
    /// exist or isn't a directory.
    pub async fn add_folder(&self, config: FolderConfig) -> OrchestratorResult<String> {
        if !config.path.is_dir() {
            return Err(OrchestratorError::InvalidFolder(
                config.path.display().to_string(),
            ));
        }

        let folder_id = folder_id_for(&config.path);
        if self.folders.contains_key(&folder_id) {
            return Ok(folder_id);
        }

        let folder_dir = self.state_dir.join(&folder_id);
        tokio::fs::create_dir_all(&folder_dir)
            .await
            .map_err(|e| OrchestratorError::Other(e.to_string()))?;
        let store: Arc<dyn EmbeddingStore> = Arc::new(
            folder_mcp_store::SqliteEmbeddingStore::open(&folder_dir.join("store.db")).await?,
        );

        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let handle = FolderHandle {
            config: config.clone(),
            lifecycle: Arc::new(Mutex::new(FolderLifecycle::new())),
            store,
            events_tx: events_tx.clone(),
            cancel: CancellationToken::new(),
        };
        self.folders.insert(folder_id.clone(), handle);
        let _ = events_tx.send(FolderEvent::Added);

        self.spawn_folder_loop(folder_id.clone(), config.path);
        Ok(folder_id)
    }

    /// Stop and unregister a folder, closing its store and releasing disk
    /// handles before returning. Idempotent: removing an unknown id is a no-op.
    pub async fn remove_folder(&self, folder_id: &str) -> OrchestratorResult<()> {
        let Some((_, handle)) = self.folders.remove(folder_id) else {
            return Ok(());
        };

        {
            let mut lifecycle = handle.lifecycle.lock().await;
            let _ = lifecycle.transition(LifecycleCommand::Stop);
        }
        handle.cancel.cancel();
        let _ = handle.events_tx.send(FolderEvent::Removed);

        let store_path = self.state_dir.join(folder_id).join("store.db");
        handle.store.close().await?;
        crate::lifecycle::wait_for_handle_release(
            &crate::lifecycle::ImmediateRelease,
            &store_path,
            Duration::from_secs(20),
        )
        .await?;

        Ok(())
    }

    /// Force an immediate re-scan/re-index cycle for a folder, without
    /// waiting for the next debounced filesystem event.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::FolderNotFound`] if `folder_id` isn't registered.
    pub async fn reload_folder(&self, folder_id: &str) -> OrchestratorResult<()> {
        let handle = self
            .folders
            .get(folder_id)
            .ok_or_else(|| OrchestratorError::FolderNotFound(folder_id.to_string()))?;
        let path = handle.config.path.clone();
        drop(handle);
        self.run_detect_index_cycle(folder_id, &path).await
    }

    /// Summaries of every registered folder.
    #[must_use]
    pub fn list_folders(&self) -> Vec<FolderSummary> {
        let mut summaries = Vec::with_capacity(self.folders.len());
        for entry in self.folders.iter() {
            let folder_id = entry.key().clone();
            let handle = entry.value();
            summaries.push(FolderSummary {
                folder_id,
                name: handle.config.name.clone(),
                path: handle.config.path.clone(),
                state: handle.lifecycle.try_lock().map_or(FolderState::Created, |l| l.state()),
            });
        }
        summaries
    }

    /// Current state and document count for one folder.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::FolderNotFound`] if `folder_id` isn't registered.
    pub async fn get_folder_status(&self, folder_id: &str) -> OrchestratorResult<FolderStatus> {
        let handle = self
            .folders
            .get(folder_id)
            .ok_or_else(|| OrchestratorError::FolderNotFound(folder_id.to_string()))?;
        let state = handle.lifecycle.lock().await.state();
        let document_count = handle.store.list_documents(folder_id).await?.len();
        Ok(FolderStatus {
            folder_id: folder_id.to_string(),
            state,
            document_count,
        })
    }

    /// The embedding store backing one registered folder, for callers (the
    /// search layer) that need direct read access across folders.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::FolderNotFound`] if `folder_id` isn't registered.
    pub fn store_for(&self, folder_id: &str) -> OrchestratorResult<Arc<dyn EmbeddingStore>> {
        let handle = self
            .folders
            .get(folder_id)
            .ok_or_else(|| OrchestratorError::FolderNotFound(folder_id.to_string()))?;
        Ok(Arc::clone(&handle.store))
    }

    /// Every registered folder id paired with its store, for fanning out a
    /// search across all monitored folders.
    #[must_use]
    pub fn all_stores(&self) -> Vec<(String, Arc<dyn EmbeddingStore>)> {
        self.folders
            .iter()
            .map(|entry| (entry.key().clone(), Arc::clone(&entry.value().store)))
            .collect()
    }

    /// Subscribe to a folder's event stream.
    ///
    /// # Errors
    ///
    /// Returns [`OrchestratorError::FolderNotFound`] if `folder_id` isn't registered.
    pub fn subscribe(&self, folder_id: &str) -> OrchestratorResult<broadcast::Receiver<FolderEvent>> {
        let handle = self
            .folders
            .get(folder_id)
            .ok_or_else(|| OrchestratorError::FolderNotFound(folder_id.to_string()))?;
        Ok(handle.events_tx.subscribe())
    }

    fn spawn_folder_loop(&self, folder_id: String, path: PathBuf) {
        let semaphore = Arc::clone(&self.semaphore);
        let parser_registry = Arc::clone(&self.parser_registry);
        let chunking_service = Arc::clone(&self.chunking_service);
        let embedding_service = Arc::clone(&self.embedding_service);
        let pipeline_config = self.pipeline_config.clone();
        let folders = Arc::clone(&self.folders);
        let folder_id_for_task = folder_id.clone();
        let watch_debounce = self.watch_debounce;

        tokio::spawn(async move {
            let Some(handle) = folders.get(&folder_id_for_task) else {
                return;
            };
            let store = Arc::clone(&handle.store);
            let events_tx = handle.events_tx.clone();
            let lifecycle = Arc::clone(&handle.lifecycle);
            let cancel = handle.cancel.clone();
            drop(handle);

            if let Err(e) = initial_index_cycle(
                &folder_id_for_task,
                &path,
                &lifecycle,
                &store,
                &events_tx,
                &semaphore,
                &parser_registry,
                &chunking_service,
                &embedding_service,
                &pipeline_config,
            )
            .await
            {
                error!(folder_id = %folder_id_for_task, error = %e, "initial indexing failed");
                let mut lock = lifecycle.lock().await;
                let _ = lock.transition(LifecycleCommand::Fail);
                let _ = events_tx.send(FolderEvent::Error {
                    message: e.to_string(),
                });
                return;
            }

            watch_loop(
                &folder_id_for_task,
                &path,
                &lifecycle,
                &store,
                &events_tx,
                &semaphore,
                &parser_registry,
                &chunking_service,
                &embedding_service,
                &pipeline_config,
                &cancel,
                watch_debounce,
            )
            .await;
        });
    }

    async fn run_detect_index_cycle(&self, folder_id: &str, path: &Path) -> OrchestratorResult<()> {
        let handle = self
            .folders
            .get(folder_id)
            .ok_or_else(|| OrchestratorError::FolderNotFound(folder_id.to_string()))?;
        let store = Arc::clone(&handle.store);
        let events_tx = handle.events_tx.clone();
        let lifecycle = Arc::clone(&handle.lifecycle);
        drop(handle);

        reindex_cycle(
            folder_id,
            path,
            &lifecycle,
            &store,
            &events_tx,
            &self.semaphore,
            &self.parser_registry,
            &self.chunking_service,
            &self.embedding_service,
            &self.pipeline_config,
        )
        .await
    }
}

fn pipeline_config_from(chunking_config: &ChunkingConfig) -> PipelineConfig {
    PipelineConfig {
        embed_batch_size: chunking_config.embed_batch_size,
        embed_batch_timeout: Duration::from_millis(chunking_config.embed_batch_timeout_ms),
        retry_max_attempts: chunking_config.retry_max_attempts,
        retry_backoff: chunking_config
            .retry_backoff_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect(),
        channel_capacity: chunking_config.embed_batch_size.max(1) * 2,
    }
}

/// Scan, diff, and index a folder, without touching the lifecycle state.
/// Callers drive `FolderLifecycle` themselves around this, since the legal
/// command sequence differs between the first scan and a watch-triggered
/// re-index (see [`initial_index_cycle`] and [`reindex_cycle`]).
#[allow(clippy::too_many_arguments)]
async fn scan_diff_index(
    folder_id: &str,
    path: &Path,
    store: &Arc<dyn EmbeddingStore>,
    events_tx: &broadcast::Sender<FolderEvent>,
    semaphore: &Arc<Semaphore>,
    parser_registry: &Arc<ParserRegistry>,
    chunking_service: &Arc<ChunkingService>,
    embedding_service: &Arc<dyn EmbeddingService>,
    pipeline_config: &PipelineConfig,
) -> OrchestratorResult<()> {
    let scanned = detect::scan(path)?;
    let existing = store.list_documents(folder_id).await?;
    let change_set: ChangeSet = detect::diff(scanned, &existing);

    let permit = semaphore
        .clone()
        .acquire_owned()
        .await
        .map_err(|e| OrchestratorError::Other(e.to_string()))?;
    let pipeline = Pipeline::new(
        Arc::clone(parser_registry),
        Arc::clone(chunking_service),
        Arc::clone(embedding_service),
        Arc::clone(store),
        pipeline_config.clone(),
    );
    let result = pipeline.run(folder_id, path, change_set, events_tx).await;
    drop(permit);
    result.map(|_stats| ())
}

/// The first cycle for a newly-registered folder: `Created` through to
/// `Active`, via `Scanning`/`Detecting`/`Indexing`.
#[allow(clippy::too_many_arguments)]
async fn initial_index_cycle(
    folder_id: &str,
    path: &Path,
    lifecycle: &Arc<Mutex<FolderLifecycle>>,
    store: &Arc<dyn EmbeddingStore>,
    events_tx: &broadcast::Sender<FolderEvent>,
    semaphore: &Arc<Semaphore>,
    parser_registry: &Arc<ParserRegistry>,
    chunking_service: &Arc<ChunkingService>,
    embedding_service: &Arc<dyn EmbeddingService>,
    pipeline_config: &PipelineConfig,
) -> OrchestratorResult<()> {
    if matches!(lifecycle.lock().await.state(), FolderState::Created) {
        lifecycle.lock().await.transition(LifecycleCommand::Start)?;
    }
    lifecycle.lock().await.transition(LifecycleCommand::ChangesDetected)?; // Scanning -> Detecting
    lifecycle.lock().await.transition(LifecycleCommand::ChangesDetected)?; // Detecting -> Indexing

    scan_diff_index(
        folder_id,
        path,
        store,
        events_tx,
        semaphore,
        parser_registry,
        chunking_service,
        embedding_service,
        pipeline_config,
    )
    .await?;

    lifecycle.lock().await.transition(LifecycleCommand::IndexingComplete)?;
    Ok(())
}

/// A re-index cycle triggered from `Active` by a debounced filesystem
/// change: `Active` → `Watching` → `Detecting` → `Indexing` → `Active`.
#[allow(clippy::too_many_arguments)]
async fn reindex_cycle(
    folder_id: &str,
    path: &Path,
    lifecycle: &Arc<Mutex<FolderLifecycle>>,
    store: &Arc<dyn EmbeddingStore>,
    events_tx: &broadcast::Sender<FolderEvent>,
    semaphore: &Arc<Semaphore>,
    parser_registry: &Arc<ParserRegistry>,
    chunking_service: &Arc<ChunkingService>,
    embedding_service: &Arc<dyn EmbeddingService>,
    pipeline_config: &PipelineConfig,
) -> OrchestratorResult<()> {
    lifecycle.lock().await.transition(LifecycleCommand::FileSystemChange)?; // Active -> Watching
    lifecycle.lock().await.transition(LifecycleCommand::FileSystemChange)?; // Watching -> Detecting
    lifecycle.lock().await.transition(LifecycleCommand::ChangesDetected)?; // Detecting -> Indexing

    scan_diff_index(
        folder_id,
        path,
        store,
        events_tx,
        semaphore,
        parser_registry,
        chunking_service,
        embedding_service,
        pipeline_config,
    )
    .await?;

    lifecycle.lock().await.transition(LifecycleCommand::IndexingComplete)?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn watch_loop(
    folder_id: &str,
    path: &Path,
    lifecycle: &Arc<Mutex<FolderLifecycle>>,
    store: &Arc<dyn EmbeddingStore>,
    events_tx: &broadcast::Sender<FolderEvent>,
    semaphore: &Arc<Semaphore>,
    parser_registry: &Arc<ParserRegistry>,
    chunking_service: &Arc<ChunkingService>,
    embedding_service: &Arc<dyn EmbeddingService>,
    pipeline_config: &PipelineConfig,
    cancel: &CancellationToken,
    watch_debounce: Duration,
) {
    let (tx, mut rx) = mpsc::channel::<()>(1);

    let mut watcher = match RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            if res.is_ok() {
                let _ = tx.try_send(());
            }
        },
        notify::Config::default(),
    ) {
        Ok(w) => w,
        Err(e) => {
            warn!(folder_id, error = %e, "failed to start filesystem watcher");
            return;
        }
    };

    if let Err(e) = watcher.watch(path, RecursiveMode::Recursive) {
        warn!(folder_id, error = %e, "failed to watch folder path");
        return;
    }

    loop {
        tokio::select! {
            () = cancel.cancelled() => {
                info!(folder_id, "stopping folder watcher");
                return;
            }
            maybe = rx.recv() => {
                if maybe.is_none() {
                    return;
                }
                tokio::time::sleep(watch_debounce).await;
                while rx.try_recv().is_ok() {}

                if let Err(e) = reindex_cycle(
                    folder_id,
                    path,
                    lifecycle,
                    store,
                    events_tx,
                    semaphore,
                    parser_registry,
                    chunking_service,
                    embedding_service,
                    pipeline_config,
                )
                .await
                {
                    error!(folder_id, error = %e, "re-index cycle failed");
                    let _ = lifecycle.lock().await.transition(LifecycleCommand::Fail);
                    let _ = events_tx.send(FolderEvent::Error { message: e.to_string() });
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folder_id_is_deterministic_for_same_path() {
        let path = std::path::Path::new("/tmp/some-folder-that-need-not-exist");
        assert_eq!(folder_id_for(path), folder_id_for(path));
    }
}

//! The five-stage indexing pipeline: detect, parse, chunk, embed, persist.
//!
//! Stages run concurrently, connected by bounded `tokio::sync::mpsc`
//! channels so a slow downstream stage applies backpressure upstream
//! instead of buffering unboundedly in memory.

use crate::detect::ChangeSet;
use crate::error::OrchestratorResult;
use crate::events::{FolderEvent, ProgressSnapshot};
use folder_mcp_embeddings::EmbeddingService;
use folder_mcp_parsing::{ChunkingService, ParserRegistry};
use folder_mcp_store::{Chunk, DocumentStatus, EmbeddingStore, NewDocument};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::{broadcast, mpsc};
use tracing::{debug, warn};

/// Tunable pipeline behavior, mirroring `folder-mcp-config::ChunkingConfig`.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub embed_batch_size: usize,
    pub embed_batch_timeout: Duration,
    pub retry_max_attempts: u32,
    pub retry_backoff: Vec<Duration>,
    pub channel_capacity: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            embed_batch_size: 32,
            embed_batch_timeout: Duration::from_millis(100),
            retry_max_attempts: 3,
            retry_backoff: vec![
                Duration::from_millis(100),
                Duration::from_secs(1),
                Duration::from_secs(10),
            ],
            channel_capacity: 64,
        }
    }
}

/// Aggregate counts produced by a single pipeline run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub documents_indexed: usize,
    pub documents_failed: usize,
    pub documents_deleted: usize,
    pub chunks_written: usize,
}

struct ParsedFile {
    folder_id: String,
    document_id: String,
    relative_path: String,
    content_hash: String,
    size: u64,
    mtime: i64,
    parsed: folder_mcp_parsing::ParsedDocument,
}

struct ChunkedFile {
    folder_id: String,
    document_id: String,
    relative_path: String,
    content_hash: String,
    size: u64,
    mtime: i64,
    chunks: Vec<Chunk>,
}

#[derive(Default)]
struct Counters {
    total_files: AtomicUsize,
    processed_files: AtomicUsize,
    total_chunks: AtomicUsize,
    processed_chunks: AtomicUsize,
    early_failures: AtomicUsize,
}

/// Drives the five stages against one folder's [`ChangeSet`], streaming
/// progress events and returning when every changed document has reached
/// `ready` or `failed`.
pub struct Pipeline {
    parser_registry: Arc<ParserRegistry>,
    chunking_service: Arc<ChunkingService>,
    embedding_service: Arc<dyn EmbeddingService>,
    store: Arc<dyn EmbeddingStore>,
    config: PipelineConfig,
}

impl Pipeline {
    #[must_use]
    pub fn new(
        parser_registry: Arc<ParserRegistry>,
        chunking_service: Arc<ChunkingService>,
        embedding_service: Arc<dyn EmbeddingService>,
        store: Arc<dyn EmbeddingStore>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            parser_registry,
            chunking_service,
            embedding_service,
            store,
            config,
        }
    }

    /// Run the pipeline over `change_set` for `folder_id`/`folder_root`,
    /// emitting `FolderEvent`s on `events`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store can't be reached at all; per-document
    /// parse/embed failures are recorded on the document instead of failing
    /// the whole run.
    pub async fn run(
        &self,
        folder_id: &str,
        folder_root: &std::path::Path,
        change_set: ChangeSet,
        events: &broadcast::Sender<FolderEvent>,
    ) -> OrchestratorResult<PipelineStats> {
        let mut stats = PipelineStats::default();

        for path in &change_set.deleted {
            let document_id = folder_mcp_store::ids::document_id(folder_id, path);
            self.store.delete_document(&document_id).await?;
            stats.documents_deleted += 1;
        }

        let counters = Arc::new(Counters::default());
        let to_index: Vec<_> = change_set.new.into_iter().chain(change_set.modified).collect();
        counters.total_files.store(to_index.len(), Ordering::Relaxed);

        if to_index.is_empty() {
            return Ok(stats);
        }

        let _ = events.send(FolderEvent::IndexingStarted);

        let (parse_tx, parse_rx) = mpsc::channel(self.config.channel_capacity);
        let (chunk_tx, chunk_rx) = mpsc::channel(self.config.channel_capacity);
        let (embed_tx, embed_rx) = mpsc::channel(self.config.channel_capacity);

        let progress_handle = {
            let counters = Arc::clone(&counters);
            let events = events.clone();
            tokio::spawn(async move { report_progress(&counters, &events).await })
        };

        let parse_handle = self.spawn_parse_stage(
            folder_id.to_string(),
            folder_root.to_path_buf(),
            to_index,
            parse_tx,
            Arc::clone(&counters),
        );
        let chunk_handle = self.spawn_chunk_stage(parse_rx, chunk_tx, Arc::clone(&counters));
        let embed_handle = self.spawn_embed_stage(chunk_rx, embed_tx, Arc::clone(&counters));
        let persist_stats = self.run_persist_stage(embed_rx, &counters).await?;

        stats.documents_indexed += persist_stats.documents_indexed;
        stats.documents_failed += persist_stats.documents_failed;
        stats.chunks_written += persist_stats.chunks_written;

        let _ = tokio::join!(parse_handle, chunk_handle, embed_handle);
        stats.documents_failed += counters.early_failures.load(Ordering::Relaxed);
        progress_handle.abort();

        let _ = events.send(FolderEvent::IndexingComplete);
        Ok(stats)
    }

    fn spawn_parse_stage(
        &self,
        folder_id: String,
        folder_root: PathBuf,
        files: Vec<crate::detect::ScannedFile>,
        tx: mpsc::Sender<ParsedFile>,
        counters: Arc<Counters>,
    ) -> tokio::task::JoinHandle<()> {
        let parser_registry = Arc::clone(&self.parser_registry);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            for file in files {
                let full_path = folder_root.join(&file.relative_path);
                let bytes = match tokio::fs::read(&full_path).await {
                    Ok(b) => b,
                    Err(e) => {
                        warn!(path = %full_path.display(), error = %e, "failed to read file for parsing");
                        continue;
                    }
                };

                match parser_registry.parse(&bytes, &file.relative_path) {
                    Ok(parsed) => {
                        let document_id = folder_mcp_store::ids::document_id(&folder_id, &file.relative_path);
                        if tx
                            .send(ParsedFile {
                                folder_id: folder_id.clone(),
                                document_id,
                                relative_path: file.relative_path,
                                content_hash: file.content_hash,
                                size: file.size,
                                mtime: file.mtime,
                                parsed,
                            })
                            .await
                            .is_err()
                        {
                            return;
                        }
                    }
                    Err(e) => {
                        debug!(path = %file.relative_path, error = %e, "parse failed, marking document failed");
                        mark_document_failed(
                            &store,
                            &counters,
                            folder_id.clone(),
                            file.relative_path,
                            file.content_hash,
                            file.size,
                            file.mtime,
                        )
                        .await;
                    }
                }
            }
        })
    }

    fn spawn_chunk_stage(
        &self,
        mut rx: mpsc::Receiver<ParsedFile>,
        tx: mpsc::Sender<ChunkedFile>,
        counters: Arc<Counters>,
    ) -> tokio::task::JoinHandle<()> {
        let chunking_service = Arc::clone(&self.chunking_service);
        let store = Arc::clone(&self.store);
        tokio::spawn(async move {
            while let Some(file) = rx.recv().await {
                let drafts = match chunking_service.chunk(&file.parsed) {
                    Ok(d) => d,
                    Err(e) => {
                        debug!(path = %file.relative_path, error = %e, "chunking failed, marking document failed");
                        mark_document_failed(
                            &store,
                            &counters,
                            file.folder_id,
                            file.relative_path,
                            file.content_hash,
                            file.size,
                            file.mtime,
                        )
                        .await;
                        continue;
                    }
                };

                let chunks: Vec<Chunk> = drafts
                    .into_iter()
                    .map(|draft| {
                        let chunk_id = folder_mcp_store::ids::chunk_id(&file.document_id, draft.ordinal);
                        Chunk::from_draft(chunk_id, file.document_id.clone(), draft)
                    })
                    .collect();

                counters.total_chunks.fetch_add(chunks.len(), Ordering::Relaxed);

                if tx
                    .send(ChunkedFile {
                        folder_id: file.folder_id,
                        document_id: file.document_id,
                        relative_path: file.relative_path,
                        content_hash: file.content_hash,
                        size: file.size,
                        mtime: file.mtime,
                        chunks,
                    })
                    .await
                    .is_err()
                {
                    return;
                }
            }
        })
    }

    fn spawn_embed_stage(
        &self,
        mut rx: mpsc::Receiver<ChunkedFile>,
        tx: mpsc::Sender<(ChunkedFile, Option<Vec<Vec<f32>>>)>,
        counters: Arc<Counters>,
    ) -> tokio::task::JoinHandle<()> {
        let embedding_service = Arc::clone(&self.embedding_service);
        let config = self.config.clone();
        tokio::spawn(async move {
            while let Some(file) = rx.recv().await {
                let texts: Vec<&str> = file.chunks.iter().map(|c| c.content.as_str()).collect();
                let result = embed_with_retry(embedding_service.as_ref(), &texts, &config).await;

                if result.is_none() {
                    warn!(document_id = %file.document_id, "embedding failed after retries");
                }

                counters.processed_chunks.fetch_add(file.chunks.len(), Ordering::Relaxed);
                if tx.send((file, result)).await.is_err() {
                    return;
                }
            }
        })
    }

    async fn run_persist_stage(
        &self,
        mut rx: mpsc::Receiver<(ChunkedFile, Option<Vec<Vec<f32>>>)>,
        counters: &Arc<Counters>,
    ) -> OrchestratorResult<PipelineStats> {
        let mut stats = PipelineStats::default();

        while let Some((file, embeddings)) = rx.recv().await {
            let Some(embeddings) = embeddings else {
                self.store
                    .upsert_document(NewDocument {
                        folder_id: file.folder_id,
                        path: file.relative_path,
                        content_hash: file.content_hash,
                        size: i64::try_from(file.size).unwrap_or(i64::MAX),
                        mtime: file.mtime,
                        status: DocumentStatus::Failed,
                    })
                    .await?;
                stats.documents_failed += 1;
                counters.processed_files.fetch_add(1, Ordering::Relaxed);
                continue;
            };

            let model_name = self.embedding_service.provider().model_name().to_string();
            let chunk_count = file.chunks.len();

            self.store
                .upsert_document(NewDocument {
                    folder_id: file.folder_id.clone(),
                    path: file.relative_path.clone(),
                    content_hash: file.content_hash.clone(),
                    size: i64::try_from(file.size).unwrap_or(i64::MAX),
                    mtime: file.mtime,
                    status: DocumentStatus::Chunking,
                })
                .await?;

            self.store.upsert_chunks(&file.document_id, file.chunks.clone()).await?;

            let rows = file
                .chunks
                .iter()
                .zip(embeddings)
                .map(|(chunk, vector)| (chunk.id.clone(), model_name.clone(), vector))
                .collect();
            self.store.upsert_embeddings(rows).await?;

            self.store
                .upsert_document(NewDocument {
                    folder_id: file.folder_id,
                    path: file.relative_path,
                    content_hash: file.content_hash,
                    size: i64::try_from(file.size).unwrap_or(i64::MAX),
                    mtime: file.mtime,
                    status: DocumentStatus::Ready,
                })
                .await?;

            stats.documents_indexed += 1;
            stats.chunks_written += chunk_count;
            counters.processed_files.fetch_add(1, Ordering::Relaxed);
        }

        Ok(stats)
    }
}

/// Records a document that never made it past parsing or chunking as
/// `failed`, rather than silently dropping it from the store.
async fn mark_document_failed(
    store: &Arc<dyn EmbeddingStore>,
    counters: &Counters,
    folder_id: String,
    relative_path: String,
    content_hash: String,
    size: u64,
    mtime: i64,
) {
    let result = store
        .upsert_document(NewDocument {
            folder_id,
            path: relative_path.clone(),
            content_hash,
            size: i64::try_from(size).unwrap_or(i64::MAX),
            mtime,
            status: DocumentStatus::Failed,
        })
        .await;
    if let Err(e) = result {
        warn!(path = %relative_path, error = %e, "failed to record document as failed");
    }
    counters.early_failures.fetch_add(1, Ordering::Relaxed);
    counters.processed_files.fetch_add(1, Ordering::Relaxed);
}

async fn embed_with_retry(
    service: &dyn EmbeddingService,
    texts: &[&str],
    config: &PipelineConfig,
) -> Option<Vec<Vec<f32>>> {
    let mut attempt = 0;
    loop {
        match service.generate_embeddings(texts.to_vec()).await {
            Ok(vectors) => return Some(vectors),
            Err(e) if attempt < config.retry_max_attempts => {
                let backoff = config
                    .retry_backoff
                    .get(attempt as usize)
                    .copied()
                    .unwrap_or_else(|| config.retry_backoff.last().copied().unwrap_or(Duration::from_secs(1)));
                warn!(error = %e, attempt, backoff_ms = backoff.as_millis(), "retrying embedding batch");
                tokio::time::sleep(backoff).await;
                attempt += 1;
            }
            Err(e) => {
                warn!(error = %e, "embedding batch failed, giving up");
                return None;
            }
        }
    }
}

async fn report_progress(counters: &Counters, events: &broadcast::Sender<FolderEvent>) {
    let mut interval = tokio::time::interval(Duration::from_millis(500));
    loop {
        interval.tick().await;
        let snapshot = ProgressSnapshot::new(
            counters.total_files.load(Ordering::Relaxed),
            counters.processed_files.load(Ordering::Relaxed),
            counters.total_chunks.load(Ordering::Relaxed),
            counters.processed_chunks.load(Ordering::Relaxed),
        );
        let _ = events.send(FolderEvent::Progress(snapshot));
    }
}

//! Daemon supervisor: builds every service, registers configured folders,
//! and runs the selected transport alongside the signal and health loops.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use agenterra_rmcp::ServiceExt;
use agenterra_rmcp::transport::sse_server::{SseServer, SseServerConfig};
use agenterra_rmcp::transport::stdio;
use folder_mcp_config::AppConfig;
use folder_mcp_embeddings::{DefaultEmbeddingProvider, DefaultEmbeddingService, EmbeddingService};
use folder_mcp_orchestrator::FolderOrchestrator;
use folder_mcp_parsing::{ChunkingService, ParserRegistry, PlainTextParser, TokenBudget};
use folder_mcp_parsing::chunking::TokenCounterRegistry;
use folder_mcp_search::{Search, SearchService};
use tokio::sync::{Mutex, Notify};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::health;
use crate::mcp::{AppState, McpServer};
use crate::signal::{SignalEvent, SignalEventSlot, spawn_signal_listener};
use crate::transport::Transport;

/// Runtime configuration for the SSE transport, separate from [`AppConfig`]
/// since only a CLI-provided bind address and keep-alive apply to it.
#[derive(Debug, Clone)]
pub struct SseConfig {
    pub addr: SocketAddr,
    pub sse_path: String,
    pub post_path: String,
    pub keep_alive: Option<Duration>,
}

const EMBEDDING_DIMENSION: usize = 256;
const DEFAULT_MAX_EMBEDDING_TOKENS: usize = 8192;

fn build_app_state(config: &AppConfig, state_dir: PathBuf) -> (Arc<AppState>, Arc<FolderOrchestrator>) {
    let mut registry = ParserRegistry::new();
    registry.register(Box::new(PlainTextParser::new()));
    let parser_registry = Arc::new(registry);

    let counter = TokenCounterRegistry::new().default_counter();
    let budget = TokenBudget::new(
        config.chunking.target_tokens,
        config.chunking.soft_cap_multiplier,
        config.chunking.hard_cap_multiplier,
    );
    let chunking_service = Arc::new(ChunkingService::new(counter, budget));

    let provider = Arc::new(DefaultEmbeddingProvider::new(
        "local-default",
        EMBEDDING_DIMENSION,
        DEFAULT_MAX_EMBEDDING_TOKENS,
        config.daemon.performance.max_concurrent_folders,
    ));
    let embedding_service: Arc<dyn EmbeddingService> =
        Arc::new(DefaultEmbeddingService::new(provider, config.chunking.embed_batch_size));

    let orchestrator = Arc::new(FolderOrchestrator::new(
        config.daemon.performance.max_concurrent_folders,
        Arc::clone(&parser_registry),
        Arc::clone(&chunking_service),
        Arc::clone(&embedding_service),
        &config.chunking,
        state_dir,
        Duration::from_millis(config.daemon.watch_debounce_ms),
    ));

    let search: Arc<dyn SearchService> = Arc::new(Search::new(Arc::clone(&embedding_service)));

    let state = Arc::new(AppState {
        orchestrator: Arc::clone(&orchestrator),
        search,
        embeddings: embedding_service,
        config: config.clone(),
    });

    (state, orchestrator)
}

/// Builds every service, registers the configured folders, and runs the
/// daemon until a shutdown signal or an unrecoverable transport error.
///
/// # Errors
///
/// Returns an error if the selected transport fails to bind or serve.
pub async fn start(
    transport: Transport,
    sse_addr: SocketAddr,
    config: AppConfig,
    state_dir: PathBuf,
) -> anyhow::Result<()> {
    let (state, orchestrator) = build_app_state(&config, state_dir);

    for folder in config.folders.iter().filter(|f| f.enabled) {
        if let Err(e) = orchestrator.add_folder(folder.clone()).await {
            error!(folder = %folder.name, error = ?e, "failed to register folder");
        }
    }

    let notify = Arc::new(Notify::new());
    let signal_slot: SignalEventSlot = Arc::new(Mutex::new(None));
    spawn_signal_listener(Arc::clone(&notify), Arc::clone(&signal_slot));

    let health_handle = tokio::spawn(health::run_health_monitor(
        Arc::clone(&orchestrator),
        Duration::from_secs(config.daemon.health_check_secs),
    ));

    let server_task = tokio::spawn(run_transport(transport, sse_addr, config.daemon.sse_keep_alive(), Arc::clone(&state)));

    tokio::select! {
        res = server_task => {
            match res {
                Ok(Ok(())) => info!("server task exited cleanly"),
                Ok(Err(e)) => error!(error = ?e, "server task exited with error"),
                Err(e) => error!(error = ?e, "server task panicked"),
            }
        }
        () = notify.notified() => {
            let event = signal_slot.lock().await.take();
            match event {
                Some(SignalEvent::Shutdown) | None => info!("shutting down"),
                Some(SignalEvent::Reload) => {
                    warn!("reload requested; folder set is fixed at startup, ignoring");
                }
            }
        }
    }

    health_handle.abort();
    Ok(())
}

async fn run_transport(
    transport: Transport,
    sse_addr: SocketAddr,
    sse_keep_alive: Duration,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    match transport {
        Transport::Stdio => {
            let service = McpServer::new(state).serve(stdio()).await?;
            service.waiting().await?;
            Ok(())
        }
        Transport::Sse => {
            let sse_config = SseConfig {
                addr: sse_addr,
                sse_path: "/sse".to_string(),
                post_path: "/message".to_string(),
                keep_alive: Some(sse_keep_alive),
            };
            let config = SseServerConfig {
                bind: sse_config.addr,
                sse_path: sse_config.sse_path,
                post_path: sse_config.post_path,
                ct: CancellationToken::new(),
                sse_keep_alive: sse_config.keep_alive,
            };
            let (sse_server, router) = SseServer::new(config);
            let _ct = sse_server.with_service(move || McpServer::new(Arc::clone(&state)));
            info!(addr = %sse_addr, "starting SSE transport");
            let listener = tokio::net::TcpListener::bind(sse_addr).await?;
            axum::serve(listener, router).await?;
            Ok(())
        }
    }
}

trait DaemonConfigExt {
    fn sse_keep_alive(&self) -> Duration;
}

impl DaemonConfigExt for folder_mcp_config::DaemonConfig {
    fn sse_keep_alive(&self) -> Duration {
        Duration::from_secs(self.health_check_secs)
    }
}

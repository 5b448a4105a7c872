//! Centralized configuration for `folder-mcp`.
//!
//! Configuration follows a simple hierarchy:
//! 1. Safe defaults (profile-based)
//! 2. Config file overrides (YAML or JSON, schema validated)
//! 3. Environment variable overrides (highest priority)

pub mod error;
pub mod profile;
pub mod source;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use profile::Profile;
pub use validation::Validate;

use std::path::PathBuf;

const DEFAULT_CHUNK_TARGET_TOKENS: usize = 400;
const DEFAULT_CHUNK_SOFT_CAP_MULTIPLIER: f64 = 1.5;
const DEFAULT_CHUNK_HARD_CAP_MULTIPLIER: f64 = 2.0;
const DEFAULT_EMBED_BATCH_SIZE: usize = 32;
const DEFAULT_EMBED_BATCH_TIMEOUT_MS: u64 = 100;
const DEFAULT_RETRY_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_HEALTH_CHECK_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 10;
const DEFAULT_MCP_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_WATCH_DEBOUNCE_MS: u64 = 500;

/// Root application configuration. Built once on start, replaced atomically
/// on reload; readers hold immutable snapshots (an `Arc<AppConfig>`).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AppConfig {
    /// Which base defaults this config started from.
    #[serde(default)]
    pub profile: Profile,

    /// Folders this daemon watches and indexes.
    #[serde(default)]
    pub folders: Vec<FolderConfig>,

    /// Daemon supervisor settings.
    #[serde(default)]
    pub daemon: DaemonConfig,

    /// Chunker and indexing pipeline settings.
    #[serde(default)]
    pub chunking: ChunkingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            folders: Vec::new(),
            daemon: DaemonConfig::default(),
            chunking: ChunkingConfig::default(),
        }
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> ConfigResult<()> {
        for folder in &self.folders {
            folder.validate()?;
        }
        self.daemon.validate()?;
        self.chunking.validate()?;
        Ok(())
    }
}

impl AppConfig {
    /// Apply a pre-seeded folder from the `--dir`/`-d` CLI flag, if one
    /// isn't already present under the same canonicalized path.
    #[must_use]
    pub fn with_cli_folder(mut self, dir: Option<PathBuf>) -> Self {
        if let Some(path) = dir {
            let already_present = self.folders.iter().any(|f| f.path == path);
            if !already_present {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.display().to_string());
                self.folders.push(FolderConfig {
                    path,
                    name,
                    enabled: true,
                    embeddings: FolderEmbeddingsConfig::default(),
                });
            }
        }
        self
    }
}

/// One watched folder entry from the configuration file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FolderConfig {
    /// Absolute or relative filesystem path to watch.
    pub path: PathBuf,

    /// Display name surfaced by `list_folders`.
    pub name: String,

    /// Whether this folder is actively indexed.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Embedding backend/model selection for this folder.
    #[serde(default)]
    pub embeddings: FolderEmbeddingsConfig,
}

const fn default_true() -> bool {
    true
}

impl Validate for FolderConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.name, "folders[].name")?;
        validation::validate_folder_path(&self.path)?;
        self.embeddings.validate()
    }
}

/// Embedding backend/model selection for a single folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct FolderEmbeddingsConfig {
    /// Which registered `EmbeddingProvider` backend to use.
    pub backend: String,

    /// Model identifier; must be known to the selected backend.
    pub model: String,
}

impl Default for FolderEmbeddingsConfig {
    fn default() -> Self {
        Self {
            backend: "local-default".to_string(),
            model: "local-default".to_string(),
        }
    }
}

impl Validate for FolderEmbeddingsConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_non_empty(&self.backend, "embeddings.backend")?;
        validation::validate_non_empty(&self.model, "embeddings.model")
    }
}

/// Daemon supervisor settings (§4.8).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct DaemonConfig {
    /// Interval between health monitor probes, in seconds.
    #[serde(default = "default_health_check_secs")]
    pub health_check_secs: u64,

    /// Whether a crashed folder worker should be restarted automatically.
    #[serde(default = "default_true")]
    pub auto_restart: bool,

    /// Concurrency and timeout knobs.
    #[serde(default)]
    pub performance: PerformanceConfig,

    /// Grace period for in-flight work to finish on shutdown, in seconds.
    #[serde(default = "default_shutdown_timeout_secs")]
    pub shutdown_timeout_secs: u64,

    /// How long to wait after a filesystem change before re-scanning a
    /// watched folder, coalescing bursts of events into one cycle.
    #[serde(default = "default_watch_debounce_ms")]
    pub watch_debounce_ms: u64,
}

const fn default_health_check_secs() -> u64 {
    DEFAULT_HEALTH_CHECK_SECS
}

const fn default_shutdown_timeout_secs() -> u64 {
    DEFAULT_SHUTDOWN_TIMEOUT_SECS
}

const fn default_watch_debounce_ms() -> u64 {
    DEFAULT_WATCH_DEBOUNCE_MS
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            health_check_secs: DEFAULT_HEALTH_CHECK_SECS,
            auto_restart: true,
            performance: PerformanceConfig::default(),
            shutdown_timeout_secs: DEFAULT_SHUTDOWN_TIMEOUT_SECS,
            watch_debounce_ms: DEFAULT_WATCH_DEBOUNCE_MS,
        }
    }
}

impl Validate for DaemonConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.health_check_secs, 1, 3600, "daemon.health_check_secs")?;
        validation::validate_range(
            self.shutdown_timeout_secs,
            1,
            600,
            "daemon.shutdown_timeout_secs",
        )?;
        validation::validate_range(
            self.watch_debounce_ms,
            0,
            60_000,
            "daemon.watch_debounce_ms",
        )?;
        self.performance.validate()
    }
}

/// Concurrency and timeout settings (§5).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PerformanceConfig {
    /// Bounded worker pool size for simultaneous Indexing activities.
    /// Defaults to `min(NumCPU, 4)`.
    #[serde(default = "default_max_concurrent_folders")]
    pub max_concurrent_folders: usize,

    /// Per-endpoint MCP request timeout, in seconds.
    #[serde(default = "default_mcp_request_timeout_secs")]
    pub mcp_request_timeout_secs: u64,
}

fn default_max_concurrent_folders() -> usize {
    std::thread::available_parallelism()
        .map(std::num::NonZeroUsize::get)
        .unwrap_or(1)
        .min(4)
}

const fn default_mcp_request_timeout_secs() -> u64 {
    DEFAULT_MCP_REQUEST_TIMEOUT_SECS
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            max_concurrent_folders: default_max_concurrent_folders(),
            mcp_request_timeout_secs: DEFAULT_MCP_REQUEST_TIMEOUT_SECS,
        }
    }
}

impl Validate for PerformanceConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(
            self.max_concurrent_folders as u64,
            1,
            256,
            "daemon.performance.max_concurrent_folders",
        )?;
        validation::validate_range(
            self.mcp_request_timeout_secs,
            1,
            3600,
            "daemon.performance.mcp_request_timeout_secs",
        )
    }
}

/// Chunker and indexing pipeline settings (§4.2, §4.5).
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in tokens.
    #[serde(default = "default_target_tokens")]
    pub target_tokens: usize,

    /// Soft cap as a multiplier of `target_tokens`.
    #[serde(default = "default_soft_cap_multiplier")]
    pub soft_cap_multiplier: f64,

    /// Hard cap as a multiplier of `target_tokens`.
    #[serde(default = "default_hard_cap_multiplier")]
    pub hard_cap_multiplier: f64,

    /// Embedding batch size before a flush is forced.
    #[serde(default = "default_embed_batch_size")]
    pub embed_batch_size: usize,

    /// Maximum time to wait before flushing a partial batch, in milliseconds.
    #[serde(default = "default_embed_batch_timeout_ms")]
    pub embed_batch_timeout_ms: u64,

    /// Maximum retry attempts for a failed embedding batch.
    #[serde(default = "default_retry_max_attempts")]
    pub retry_max_attempts: u32,

    /// Backoff delays between retries, in milliseconds.
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: Vec<u64>,
}

const fn default_target_tokens() -> usize {
    DEFAULT_CHUNK_TARGET_TOKENS
}

const fn default_soft_cap_multiplier() -> f64 {
    DEFAULT_CHUNK_SOFT_CAP_MULTIPLIER
}

const fn default_hard_cap_multiplier() -> f64 {
    DEFAULT_CHUNK_HARD_CAP_MULTIPLIER
}

const fn default_embed_batch_size() -> usize {
    DEFAULT_EMBED_BATCH_SIZE
}

const fn default_embed_batch_timeout_ms() -> u64 {
    DEFAULT_EMBED_BATCH_TIMEOUT_MS
}

const fn default_retry_max_attempts() -> u32 {
    DEFAULT_RETRY_MAX_ATTEMPTS
}

fn default_retry_backoff_ms() -> Vec<u64> {
    vec![100, 1_000, 10_000]
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            target_tokens: DEFAULT_CHUNK_TARGET_TOKENS,
            soft_cap_multiplier: DEFAULT_CHUNK_SOFT_CAP_MULTIPLIER,
            hard_cap_multiplier: DEFAULT_CHUNK_HARD_CAP_MULTIPLIER,
            embed_batch_size: DEFAULT_EMBED_BATCH_SIZE,
            embed_batch_timeout_ms: DEFAULT_EMBED_BATCH_TIMEOUT_MS,
            retry_max_attempts: DEFAULT_RETRY_MAX_ATTEMPTS,
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

impl Validate for ChunkingConfig {
    fn validate(&self) -> ConfigResult<()> {
        validation::validate_range(self.target_tokens as u64, 16, 8192, "chunking.target_tokens")?;
        if self.soft_cap_multiplier <= 1.0 || self.hard_cap_multiplier <= self.soft_cap_multiplier
        {
            return Err(ConfigError::Generic {
                message: "chunking caps must satisfy 1.0 < soft_cap < hard_cap".to_string(),
            });
        }
        validation::validate_range(
            self.embed_batch_size as u64,
            1,
            1024,
            "chunking.embed_batch_size",
        )?;
        validation::validate_range(
            self.retry_max_attempts as u64,
            0,
            20,
            "chunking.retry_max_attempts",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        AppConfig::default().validate().unwrap();
    }

    #[test]
    fn cli_folder_is_appended_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig::default()
            .with_cli_folder(Some(dir.path().to_path_buf()))
            .with_cli_folder(Some(dir.path().to_path_buf()));
        assert_eq!(config.folders.len(), 1);
    }

    #[test]
    fn rejects_nonexistent_folder_path() {
        let config = AppConfig {
            folders: vec![FolderConfig {
                path: PathBuf::from("/no/such/path/hopefully"),
                name: "x".to_string(),
                enabled: true,
                embeddings: FolderEmbeddingsConfig::default(),
            }],
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_inverted_chunk_caps() {
        let config = ChunkingConfig {
            soft_cap_multiplier: 2.0,
            hard_cap_multiplier: 1.5,
            ..ChunkingConfig::default()
        };
        assert!(config.validate().is_err());
    }
}

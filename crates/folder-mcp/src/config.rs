//! CLI argument parsing and configuration assembly.

use std::path::PathBuf;

use clap::Parser;
use folder_mcp_config::source::{ConfigurationLoader, TomlFileSource, YamlFileSource};
use folder_mcp_config::{AppConfig, ConfigError, Validate};

use crate::transport::Transport;

#[derive(Debug, Parser)]
#[command(name = "folder-mcp", version, about = "Per-folder semantic search daemon exposing MCP")]
pub struct Args {
    /// Folder to watch and index, in addition to any configured in a config file.
    #[arg(long, short = 'd')]
    pub dir: Option<PathBuf>,

    /// Transport to serve the MCP protocol over.
    #[arg(long, value_enum, default_value_t = Transport::Stdio)]
    pub transport: Transport,

    /// Bind address for the SSE transport.
    #[arg(long, default_value = "127.0.0.1:8080")]
    pub sse_addr: String,

    /// Directory to write rotated log files under.
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Path to a YAML/JSON or TOML configuration file.
    #[arg(long, short = 'c')]
    pub config: Option<PathBuf>,
}

/// Builds the final [`AppConfig`] from a config file (if given) plus CLI
/// overrides.
///
/// Deliberately does not register an `EnvironmentSource` alongside a file
/// source in the same [`ConfigurationLoader`]: the loader
/// replaces the accumulated config wholesale per source rather than merging
/// field-by-field, so a later environment source would silently drop the
/// file source's folders. `FOLDER_MCP_PROFILE` is applied directly onto the
/// loaded config instead.
///
/// # Errors
///
/// Returns a [`ConfigError`] if the config file can't be parsed or the
/// resulting configuration fails validation.
pub fn load_app_config(args: &Args) -> Result<AppConfig, ConfigError> {
    let mut loader = ConfigurationLoader::new();
    if let Some(path) = &args.config {
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or_default();
        loader = match extension.to_lowercase().as_str() {
            "toml" => loader.add_source(Box::new(TomlFileSource::new(path))),
            _ => loader.add_source(Box::new(YamlFileSource::new(path))),
        };
    }

    let mut config = loader.load()?;

    if let Ok(profile) = std::env::var("FOLDER_MCP_PROFILE") {
        config.profile = profile.parse()?;
    }

    config = config.with_cli_folder(args.dir.clone());
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_defaults_with_no_config_file_or_dir() {
        let args = Args {
            dir: None,
            transport: Transport::Stdio,
            sse_addr: "127.0.0.1:8080".to_string(),
            log_dir: None,
            config: None,
        };
        let config = load_app_config(&args).unwrap();
        assert!(config.folders.is_empty());
    }

    #[test]
    fn cli_dir_is_registered_as_a_folder() {
        let dir = tempfile::tempdir().unwrap();
        let args = Args {
            dir: Some(dir.path().to_path_buf()),
            transport: Transport::Stdio,
            sse_addr: "127.0.0.1:8080".to_string(),
            log_dir: None,
            config: None,
        };
        let config = load_app_config(&args).unwrap();
        assert_eq!(config.folders.len(), 1);
    }
}

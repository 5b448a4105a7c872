//! Configuration source loading and composition.

use crate::validation::Validate;
use crate::{AppConfig, ConfigResult, Profile};
use std::path::{Path, PathBuf};

/// A source `AppConfig` can be loaded from, ordered by [`priority`].
///
/// [`priority`]: ConfigurationSource::priority
pub trait ConfigurationSource {
    /// Load configuration from this source.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the source exists but cannot be parsed.
    fn load(&self) -> ConfigResult<AppConfig>;

    /// Human-readable name for debugging/logging.
    fn name(&self) -> &str;

    /// Higher number wins when sources are merged.
    fn priority(&self) -> u8;
}

/// Reads `FOLDER_MCP_PROFILE` to select the base profile. Individual field
/// overrides beyond the profile are applied by the binary's CLI layer, not
/// here, mirroring the split the teacher keeps between `EnvironmentSource`
/// and CLI argument parsing.
pub struct EnvironmentSource;

impl ConfigurationSource for EnvironmentSource {
    fn load(&self) -> ConfigResult<AppConfig> {
        let profile: Profile = std::env::var("FOLDER_MCP_PROFILE")
            .unwrap_or_else(|_| "development".to_string())
            .parse()?;

        Ok(AppConfig {
            profile,
            ..AppConfig::default()
        })
    }

    fn name(&self) -> &'static str {
        "environment"
    }

    fn priority(&self) -> u8 {
        100
    }
}

/// Loads a complete `AppConfig` from a TOML file on disk.
pub struct TomlFileSource {
    path: PathBuf,
}

impl TomlFileSource {
    /// Point this source at `path`; the file is only read on [`load`].
    ///
    /// [`load`]: ConfigurationSource::load
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for TomlFileSource {
    fn load(&self) -> ConfigResult<AppConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(toml::from_str(&content)?)
    }

    fn name(&self) -> &'static str {
        "toml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

/// Loads a complete `AppConfig` from a YAML or JSON file on disk, per §6's
/// "Configuration file (YAML/JSON, schema-validated)" requirement. JSON is a
/// strict subset of YAML 1.2 so one parser serves both.
pub struct YamlFileSource {
    path: PathBuf,
}

impl YamlFileSource {
    /// Point this source at `path`; the file is only read on [`load`].
    ///
    /// [`load`]: ConfigurationSource::load
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl ConfigurationSource for YamlFileSource {
    fn load(&self) -> ConfigResult<AppConfig> {
        let content = std::fs::read_to_string(&self.path)?;
        Ok(serde_yaml::from_str(&content)?)
    }

    fn name(&self) -> &'static str {
        "yaml_file"
    }

    fn priority(&self) -> u8 {
        50
    }
}

type ConfigSources = Vec<Box<dyn ConfigurationSource>>;

/// Composes multiple `ConfigurationSource`s into one validated `AppConfig`,
/// applying them lowest-priority first so higher-priority sources win.
pub struct ConfigurationLoader {
    sources: ConfigSources,
}

impl ConfigurationLoader {
    /// Start with no sources; built-in defaults apply until one is added.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sources: Vec::new(),
        }
    }

    /// Register another source. Order of calls doesn't matter; sources are
    /// sorted by [`ConfigurationSource::priority`] before loading.
    #[must_use]
    pub fn add_source(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.sources.push(source);
        self
    }

    /// Load and validate the final configuration.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if validation fails after all sources apply.
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let mut config = AppConfig::default();

        let mut sorted_sources = self.sources.iter().collect::<Vec<_>>();
        sorted_sources.sort_by_key(|source| source.priority());

        for source in sorted_sources {
            match source.load() {
                Ok(source_config) => {
                    tracing::debug!("loaded configuration from source: {}", source.name());
                    config = source_config;
                }
                Err(e) => {
                    tracing::warn!("failed to load from source {}: {}", source.name(), e);
                }
            }
        }

        config.validate()?;
        Ok(config)
    }
}

impl Default for ConfigurationLoader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn loads_defaults_with_no_sources() {
        let config = ConfigurationLoader::new().load().unwrap();
        assert!(config.folders.is_empty());
    }

    #[test]
    fn yaml_source_overrides_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let folder_dir = dir.path().join("watched");
        std::fs::create_dir_all(&folder_dir).unwrap();

        let config_path = dir.path().join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            "folders:\n  - path: {:?}\n    name: watched\n",
            folder_dir
        )
        .unwrap();

        let config = ConfigurationLoader::new()
            .add_source(Box::new(YamlFileSource::new(&config_path)))
            .load()
            .unwrap();

        assert_eq!(config.folders.len(), 1);
        assert_eq!(config.folders[0].name, "watched");
    }
}

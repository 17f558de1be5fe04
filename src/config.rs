//! Runtime configuration.
//!
//! Read from `keep.toml`:
//!
//! ```toml
//! database_url = "sqlite::memory:"
//! max_connections = 5
//! log_filter = "keep=debug"
//! schema_path = "schema.toml"
//! ```

use crate::error::{KeepError, KeepResult};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct KeepConfig {
    /// Database connection URL
    #[serde(default)]
    pub database_url: Option<String>,

    /// Pool size (in-memory sqlite is always pinned to one connection)
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// `tracing-subscriber` env filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Path to schema file (optional)
    #[serde(default)]
    pub schema_path: Option<String>,
}

fn default_max_connections() -> u32 {
    5
}

fn default_log_filter() -> String {
    "keep=info".to_string()
}

impl Default for KeepConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            max_connections: default_max_connections(),
            log_filter: default_log_filter(),
            schema_path: None,
        }
    }
}

impl KeepConfig {
    /// Create a new configuration builder
    pub fn builder() -> KeepConfigBuilder {
        KeepConfigBuilder::default()
    }

    pub fn from_toml(content: &str) -> KeepResult<Self> {
        toml::from_str(content)
            .map_err(|e| KeepError::Config(format!("Failed to parse config: {}", e)))
    }

    /// Load from `explicit` if given, else from the first existing default
    /// location, else defaults.
    pub fn load(explicit: Option<&Path>) -> KeepResult<Self> {
        if let Some(path) = explicit {
            return Self::load_file(path);
        }
        match Self::search_paths().into_iter().find(|path| path.exists()) {
            Some(path) => Self::load_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// `./keep.toml`, then `<config dir>/keep/config.toml`.
    pub fn search_paths() -> Vec<PathBuf> {
        let mut paths = vec![PathBuf::from("keep.toml")];
        if let Some(dir) = dirs::config_dir() {
            paths.push(dir.join("keep").join("config.toml"));
        }
        paths
    }

    fn load_file(path: &Path) -> KeepResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            KeepError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }
}

/// Builder for KeepConfig
#[derive(Debug, Default)]
pub struct KeepConfigBuilder {
    config: KeepConfig,
}

impl KeepConfigBuilder {
    /// Start from an existing configuration
    pub fn from_config(config: KeepConfig) -> Self {
        Self { config }
    }

    /// Set the database URL
    pub fn database(mut self, url: impl Into<String>) -> Self {
        self.config.database_url = Some(url.into());
        self
    }

    /// Set the pool size
    pub fn max_connections(mut self, max: u32) -> Self {
        self.config.max_connections = max;
        self
    }

    /// Set the log filter
    pub fn log_filter(mut self, filter: impl Into<String>) -> Self {
        self.config.log_filter = filter.into();
        self
    }

    /// Set the schema path
    pub fn schema(mut self, path: impl Into<String>) -> Self {
        self.config.schema_path = Some(path.into());
        self
    }

    /// Build the configuration
    pub fn build(self) -> KeepConfig {
        self.config
    }
}

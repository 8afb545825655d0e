//! Configuration loading and typed config structures for Caravan.
//!
//! The canonical configuration lives in `caravan-config.yaml` at the project
//! root. Every field has a default, so an empty or missing file yields a
//! runnable configuration: the starting world, two turns, the in-memory
//! store.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::engine::PropagationOptions;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level configuration. Mirrors `caravan-config.yaml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SimulationConfig {
    /// Where the world comes from and where it is exported.
    #[serde(default)]
    pub world: WorldConfig,

    /// Turn count and propagation tunables.
    #[serde(default)]
    pub propagation: PropagationConfig,

    /// Storage backend settings.
    #[serde(default)]
    pub infrastructure: InfrastructureConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SimulationConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// `DATABASE_URL`, when set, overrides `infrastructure.postgres_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Load configuration from `path` if it exists, otherwise use defaults.
    ///
    /// # Errors
    ///
    /// Same as [`SimulationConfig::from_file`] for an existing file.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::from_file(path);
        }
        let mut config = Self::default();
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        // serde_yml reads an empty document as unit, not as an empty map.
        let mut config: Self = if yaml.trim().is_empty() {
            Self::default()
        } else {
            serde_yml::from_str(yaml)?
        };
        config.infrastructure.apply_env_overrides();
        Ok(config)
    }
}

/// World source configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct WorldConfig {
    /// Seed for the starting world's road distances.
    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Graph document to import instead of building the starting world.
    #[serde(default)]
    pub graph_file: Option<PathBuf>,

    /// Where to write the world's graph document before the run.
    #[serde(default)]
    pub export_file: Option<PathBuf>,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            seed: default_seed(),
            graph_file: None,
            export_file: None,
        }
    }
}

/// Propagation run configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PropagationConfig {
    /// Number of turns to run, starting at turn 1.
    #[serde(default = "default_turns")]
    pub turns: u64,

    /// Optional hop ceiling. Unlimited when absent.
    #[serde(default)]
    pub max_hops: Option<u32>,
}

impl PropagationConfig {
    /// Engine options derived from this section.
    pub const fn options(&self) -> PropagationOptions {
        PropagationOptions {
            max_hops: self.max_hops,
        }
    }
}

impl Default for PropagationConfig {
    fn default() -> Self {
        Self {
            turns: default_turns(),
            max_hops: None,
        }
    }
}

/// Storage backend configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct InfrastructureConfig {
    /// `PostgreSQL` connection string. The in-memory store is used when
    /// absent.
    #[serde(default)]
    pub postgres_url: Option<String>,

    /// Maximum pooled database connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

impl InfrastructureConfig {
    /// Override the database URL with `DATABASE_URL` when set.
    pub fn apply_env_overrides(&mut self) {
        if let Some(val) = std::env::var("DATABASE_URL").ok().filter(|v| !v.is_empty()) {
            self.postgres_url = Some(val);
        }
    }
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            postgres_url: None,
            max_connections: default_max_connections(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::Pretty,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions (serde default requires named functions)
// ---------------------------------------------------------------------------

const fn default_seed() -> u64 {
    42
}

const fn default_turns() -> u64 {
    2
}

const fn default_max_connections() -> u32 {
    5
}

fn default_log_level() -> String {
    "info".to_owned()
}

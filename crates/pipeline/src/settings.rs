//! Layered configuration

use std::path::Path;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use generator::Vocabulary;
use inference_engine::ModelConfig;
use serde::{Deserialize, Serialize};
use storage::StorageConfig;

use crate::retry::RetryPolicy;

/// Environment variable naming the config file
pub const CONFIG_PATH_VAR: &str = "SENTINEL_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "sentinel.toml";

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Ingestion limits and persistence retry
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Largest synthetic batch accepted by `ingest_batch`
    pub max_batch_size: usize,
    /// Retries for a transient store failure after analysis succeeded
    pub persist_retries: u32,
    /// Linear backoff step between retries (ms)
    pub retry_backoff_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 100,
            persist_retries: 2,
            retry_backoff_ms: 50,
        }
    }
}

impl PipelineConfig {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            retries: self.persist_retries,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub storage: StorageConfig,
    pub pipeline: PipelineConfig,
    pub generator: Vocabulary,
    /// Default log filter when `RUST_LOG` is unset
    pub log_level: String,
    pub log_format: LogFormat,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            model: ModelConfig::default(),
            storage: StorageConfig::default(),
            pipeline: PipelineConfig::default(),
            generator: Vocabulary::default(),
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

impl Settings {
    /// Load from `$SENTINEL_CONFIG` (default `sentinel.toml`) and the
    /// environment
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_from(Path::new(&path))
    }

    /// Layer defaults, the optional file at `path`, `SENTINEL__*`
    /// variables, then `DATABASE_URL`
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("SENTINEL")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            );

        if let Ok(url) = std::env::var("DATABASE_URL") {
            builder = builder.set_override("storage.database_url", url)?;
        }

        builder.build()?.try_deserialize()
    }
}

use serde::{Deserialize, Serialize};

use crate::metrics::MAX_SERIES_SECS;

/// Environment variables with this prefix override file settings,
/// e.g. `LOADSCOPE_STORE__BACKEND=redis`.
pub const ENV_PREFIX: &str = "LOADSCOPE";

/// Default config file (extension resolved by the `config` crate).
pub const DEFAULT_CONFIG_PATH: &str = "config/default";

/// Top-level service configuration. Every field has a default so an empty
/// or missing file yields a runnable in-memory setup.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub query: QueryConfig,
    pub ingest: IngestConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    Redis,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub redis_url: String,
    /// Sorted-set key holding the samples
    pub redis_key: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Memory,
            redis_url: "redis://127.0.0.1:6379/".into(),
            redis_key: "loadscope:samples".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    /// Series length used when a request names neither `window` nor `start`
    pub default_window_secs: u64,
    /// Upper bound on series length; unbounded when unset
    pub max_window_secs: Option<u64>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            default_window_secs: 60,
            max_window_secs: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Trust a payload's integer `timestamp` (epoch seconds) over arrival time
    pub accept_client_timestamp: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter used when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            json: false,
        }
    }
}

impl AppConfig {
    /// Load `path` (optional) layered under `LOADSCOPE_*` environment variables.
    pub fn load(path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_addr.trim().is_empty() {
            return Err("server.bind_addr cannot be empty".to_string());
        }

        if self.query.default_window_secs == 0 {
            return Err("query.default_window_secs must be at least 1".to_string());
        }

        if self.query.default_window_secs > MAX_SERIES_SECS {
            return Err(format!(
                "query.default_window_secs cannot exceed {MAX_SERIES_SECS} seconds"
            ));
        }

        if let Some(max) = self.query.max_window_secs {
            if max > MAX_SERIES_SECS {
                return Err(format!(
                    "query.max_window_secs ({max}) cannot exceed {MAX_SERIES_SECS} seconds"
                ));
            }
            if max < self.query.default_window_secs {
                return Err(format!(
                    "query.max_window_secs ({max}) is smaller than query.default_window_secs ({})",
                    self.query.default_window_secs
                ));
            }
        }

        if self.store.backend == StoreBackend::Redis && self.store.redis_key.is_empty() {
            return Err("store.redis_key cannot be empty".to_string());
        }

        Ok(())
    }
}

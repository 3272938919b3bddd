//! Collector configuration loading and resolution

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the collector base URL.
pub const API_BASE_ENV: &str = "INTERLOG_API_BASE";

/// Path of the batch-logging endpoint on the collector.
pub const DEFAULT_ENDPOINT: &str = "/api/log-session-interactions";

/// Payload cap for the beacon transport, mirroring user-agent beacon quotas.
pub const DEFAULT_BEACON_MAX_BYTES: usize = 64 * 1024;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Collector connection settings shared by the delivery transports.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Base URL of the collector. Empty means "same origin" for a
    /// browser-hosted client; a native client has no origin, so transports
    /// treat a non-absolute base as unavailable rather than erroring.
    pub api_base: String,
    /// Path of the batch-logging endpoint.
    pub endpoint: String,
    /// Payloads larger than this are rejected by the beacon transport and
    /// fall through to the keepalive transport.
    pub beacon_max_bytes: usize,
    /// Timeout applied to each delivery request.
    pub request_timeout: Duration,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            api_base: String::new(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            beacon_max_bytes: DEFAULT_BEACON_MAX_BYTES,
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

/// On-disk configuration file shape (all fields optional).
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    api_base: Option<String>,
    endpoint: Option<String>,
    beacon_max_bytes: Option<usize>,
    request_timeout_secs: Option<u64>,
}

impl CollectorConfig {
    /// Create a configuration for the given base URL with default settings.
    pub fn new(api_base: impl Into<String>) -> Self {
        Self {
            api_base: api_base.into(),
            ..Self::default()
        }
    }

    /// Resolve configuration following the priority order:
    /// 1. Command-line argument (highest priority)
    /// 2. Environment variable (`INTERLOG_API_BASE`)
    /// 3. TOML config file (`<config dir>/interlog/config.toml`)
    /// 4. Compiled defaults (fallback)
    pub fn load(cli_api_base: Option<&str>) -> Result<Self> {
        let mut config = match default_config_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };

        if let Ok(base) = std::env::var(API_BASE_ENV) {
            config.api_base = base;
        }

        if let Some(base) = cli_api_base {
            config.api_base = base.to_string();
        }

        Ok(config)
    }

    /// Load configuration from a TOML file, falling back to defaults for
    /// fields the file does not set.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let file: ConfigFile = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;

        let mut config = Self::default();
        if let Some(api_base) = file.api_base {
            config.api_base = api_base;
        }
        if let Some(endpoint) = file.endpoint {
            config.endpoint = endpoint;
        }
        if let Some(max_bytes) = file.beacon_max_bytes {
            config.beacon_max_bytes = max_bytes;
        }
        if let Some(secs) = file.request_timeout_secs {
            config.request_timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    /// Full URL of the batch-logging endpoint.
    pub fn collector_url(&self) -> String {
        format!("{}{}", self.api_base.trim_end_matches('/'), self.endpoint)
    }
}

/// Default configuration file path for the platform.
fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("interlog").join("config.toml"))
}

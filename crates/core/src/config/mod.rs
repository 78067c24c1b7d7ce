//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (NRFEED_*)
//! 2. TOML config file (if NRFEED_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (NRFEED_*)
/// 2. TOML config file (if NRFEED_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite feed cache.
    ///
    /// Set via NRFEED_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Directory holding the per-feed lock files.
    ///
    /// Every worker process on the host must use the same directory.
    /// Set via NRFEED_LOCK_DIR environment variable.
    #[serde(default = "default_lock_dir")]
    pub lock_dir: PathBuf,

    /// Path to the feed registry JSON file.
    ///
    /// Set via NRFEED_FEEDS_PATH environment variable.
    #[serde(default = "default_feeds_path")]
    pub feeds_path: PathBuf,

    /// Address the HTTP server listens on.
    ///
    /// Set via NRFEED_BIND_ADDR environment variable.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// User-Agent string for upstream requests.
    ///
    /// Set via NRFEED_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Upstream request timeout in milliseconds.
    ///
    /// Set via NRFEED_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum upstream page size in bytes.
    ///
    /// Set via NRFEED_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// Age up to which a cached feed is served without a refresh attempt.
    ///
    /// Set via NRFEED_FRESHNESS_SECS environment variable.
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,

    /// Window in which repeated fetches of one URL reuse the last response.
    ///
    /// Set via NRFEED_RATE_LIMIT_SECS environment variable.
    #[serde(default = "default_rate_limit_secs")]
    pub rate_limit_secs: u64,

    /// Window in which identical feed requests share one result.
    ///
    /// Set via NRFEED_MEMO_SECS environment variable.
    #[serde(default = "default_memo_secs")]
    pub memo_secs: u64,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./nrfeed-cache.sqlite")
}

fn default_lock_dir() -> PathBuf {
    std::env::temp_dir().join("nrfeed-locks")
}

fn default_feeds_path() -> PathBuf {
    PathBuf::from("./feeds.json")
}

fn default_bind_addr() -> String {
    "127.0.0.1:8080".into()
}

fn default_user_agent() -> String {
    "nrfeed/0.1".into()
}

fn default_timeout_ms() -> u64 {
    5_000
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_freshness_secs() -> u64 {
    300
}

fn default_rate_limit_secs() -> u64 {
    60
}

fn default_memo_secs() -> u64 {
    10
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            lock_dir: default_lock_dir(),
            feeds_path: default_feeds_path(),
            bind_addr: default_bind_addr(),
            user_agent: default_user_agent(),
            timeout_ms: default_timeout_ms(),
            max_bytes: default_max_bytes(),
            freshness_secs: default_freshness_secs(),
            rate_limit_secs: default_rate_limit_secs(),
            memo_secs: default_memo_secs(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn freshness_window(&self) -> chrono::Duration {
        secs(self.freshness_secs)
    }

    pub fn rate_limit_window(&self) -> chrono::Duration {
        secs(self.rate_limit_secs)
    }

    pub fn memo_window(&self) -> chrono::Duration {
        secs(self.memo_secs)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `NRFEED_`
    /// 2. TOML file from `NRFEED_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("NRFEED_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("NRFEED_")
                .ignore(&["config_file"])
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        Self::extract(figment)
    }

    /// Extract and validate a configuration from an assembled figment.
    pub fn extract(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}

/// Upper bound for every cache window (one year).
pub const MAX_WINDOW_SECS: u64 = 31_536_000;

fn secs(value: u64) -> chrono::Duration {
    chrono::Duration::seconds(value.min(MAX_WINDOW_SECS) as i64)
}

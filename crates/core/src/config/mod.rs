//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (WXCACHE_*)
//! 2. TOML config file (if WXCACHE_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use chrono_tz::Tz;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

use crate::cache::{CacheConfig, CacheTimeout};

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (WXCACHE_*)
/// 2. TOML config file (if WXCACHE_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root of the on-disk forecast cache.
    ///
    /// Set via WXCACHE_CACHE_DIR environment variable.
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,

    /// IANA timezone used to decide which calendar day a fetch belongs to.
    ///
    /// Set via WXCACHE_TIMEZONE environment variable.
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Freshness window in seconds for serving cached forecasts; -1 means unbounded.
    ///
    /// Set via WXCACHE_CACHE_TIMEOUT_SECS environment variable.
    #[serde(default = "default_cache_timeout_secs")]
    pub cache_timeout_secs: i64,

    /// Append-only log of answered mail requests.
    ///
    /// Set via WXCACHE_REGISTRY_PATH environment variable.
    #[serde(default = "default_registry_path")]
    pub registry_path: PathBuf,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via WXCACHE_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via WXCACHE_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via WXCACHE_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_registry_path() -> PathBuf {
    PathBuf::from("email_registry.txt")
}

fn default_timezone() -> String {
    "US/Pacific".into()
}

fn default_cache_timeout_secs() -> i64 {
    300
}

fn default_user_agent() -> String {
    "wxcache/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            timezone: default_timezone(),
            cache_timeout_secs: default_cache_timeout_secs(),
            registry_path: default_registry_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `WXCACHE_`
    /// 2. TOML file from `WXCACHE_CONFIG_FILE` (if set)
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

        if let Ok(config_path) = std::env::var("WXCACHE_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("WXCACHE_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }

    /// Parsed reference timezone.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if `timezone` is not a known IANA name.
    pub fn tz(&self) -> Result<Tz, ConfigError> {
        self.timezone.parse::<Tz>().map_err(|e| ConfigError::Invalid {
            field: "timezone".into(),
            reason: e.to_string(),
        })
    }

    /// Default freshness window.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` for negative values other than -1.
    pub fn cache_timeout(&self) -> Result<CacheTimeout, ConfigError> {
        CacheTimeout::from_secs(self.cache_timeout_secs).ok_or_else(|| ConfigError::Invalid {
            field: "cache_timeout_secs".into(),
            reason: "must be -1 (unbounded) or a non-negative number of seconds".into(),
        })
    }

    /// Build the configuration object handed to `ForecastCache::new`.
    pub fn cache_config(&self) -> Result<CacheConfig, ConfigError> {
        Ok(CacheConfig {
            base_dir: self.cache_dir.clone(),
            timezone: self.tz()?,
            default_timeout: self.cache_timeout()?,
        })
    }
}

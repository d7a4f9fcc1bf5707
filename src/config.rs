// src/config.rs

//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP fetching behavior
    #[serde(default)]
    pub fetcher: FetcherConfig,

    /// Cache TTL and refresh cooldown
    #[serde(default)]
    pub cache: CacheConfig,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.fetcher.user_agent.trim().is_empty() {
            return Err(AppError::config("fetcher.user_agent is empty"));
        }
        if self.fetcher.timeout_secs == 0 {
            return Err(AppError::config("fetcher.timeout_secs must be > 0"));
        }
        if self.fetcher.backoff_schedule_ms.is_empty() {
            return Err(AppError::config(
                "fetcher.backoff_schedule_ms must not be empty",
            ));
        }
        if self.cache.ttl_hours == 0 {
            return Err(AppError::config("cache.ttl_hours must be > 0"));
        }
        if self.cache.cooldown_hours == 0 {
            return Err(AppError::config("cache.cooldown_hours must be > 0"));
        }
        Ok(())
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            fetcher: FetcherConfig::default(),
            cache: CacheConfig::default(),
        }
    }
}

/// HTTP client and retry behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetcherConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Additional attempts after the first failure
    #[serde(default = "defaults::max_retries")]
    pub max_retries: usize,

    /// Per-retry sleep in milliseconds; index = retry number
    #[serde(default = "defaults::backoff_schedule")]
    pub backoff_schedule_ms: Vec<u64>,

    /// Upstream-bypass proxy credential; requests are routed through the
    /// proxy service when set
    #[serde(default)]
    pub api_key: Option<String>,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            backoff_schedule_ms: defaults::backoff_schedule(),
            api_key: None,
        }
    }
}

/// Cache freshness settings. TTL and cooldown default to the same six hours
/// but are independently configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Hours before a cached profile is eligible for refresh
    #[serde(default = "defaults::ttl_hours")]
    pub ttl_hours: u64,

    /// Minimum hours between forced refreshes for one identifier
    #[serde(default = "defaults::cooldown_hours")]
    pub cooldown_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: defaults::ttl_hours(),
            cooldown_hours: defaults::cooldown_hours(),
        }
    }
}

mod defaults {
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; pacegrade/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> usize {
        3
    }
    pub fn backoff_schedule() -> Vec<u64> {
        vec![500, 1000, 2000]
    }
    pub fn ttl_hours() -> u64 {
        6
    }
    pub fn cooldown_hours() -> u64 {
        6
    }
}

//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Largest page the timeline endpoint serves.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Remote timeline API settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Locations of secret files
    #[serde(default)]
    pub credentials: CredentialsConfig,

    /// On-disk cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Collection concurrency settings
    #[serde(default)]
    pub collector: CollectorConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.page_size == 0 || self.api.page_size > MAX_PAGE_SIZE {
            return Err(AppError::validation(format!(
                "api.page_size must be within 1..={MAX_PAGE_SIZE}"
            )));
        }
        Url::parse(&self.api.base_url)
            .map_err(|e| AppError::validation(format!("api.base_url is invalid: {e}")))?;
        if self.collector.max_concurrent == 0 {
            return Err(AppError::validation("collector.max_concurrent must be > 0"));
        }
        if self.collector.stream_capacity == 0 {
            return Err(AppError::validation("collector.stream_capacity must be > 0"));
        }
        Ok(())
    }
}

/// Remote timeline API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Scheme and host of the API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Posts requested per page
    #[serde(default = "defaults::page_size")]
    pub page_size: u32,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            page_size: defaults::page_size(),
        }
    }
}

/// Paths to the secret files holding API credentials.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CredentialsConfig {
    #[serde(default = "defaults::api_key_file")]
    pub api_key_file: PathBuf,

    #[serde(default = "defaults::api_secret_file")]
    pub api_secret_file: PathBuf,

    /// Pre-issued bearer token, used instead of the key pair when present
    #[serde(default = "defaults::bearer_token_file")]
    pub bearer_token_file: PathBuf,
}

impl Default for CredentialsConfig {
    fn default() -> Self {
        Self {
            api_key_file: defaults::api_key_file(),
            api_secret_file: defaults::api_secret_file(),
            bearer_token_file: defaults::bearer_token_file(),
        }
    }
}

/// On-disk cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding the `data/` tree
    #[serde(default = "defaults::cache_root")]
    pub root: PathBuf,
}

impl CacheConfig {
    /// Directory containing one subdirectory per user.
    pub fn data_dir(&self) -> PathBuf {
        self.root.join("data")
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            root: defaults::cache_root(),
        }
    }
}

/// Collection concurrency settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectorConfig {
    /// Maximum users collected at the same time
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,

    /// Capacity of the output stream
    #[serde(default = "defaults::stream_capacity")]
    pub stream_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            max_concurrent: defaults::max_concurrent(),
            stream_capacity: defaults::stream_capacity(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // API defaults
    pub fn base_url() -> String {
        "https://api.twitter.com".into()
    }
    pub fn user_agent() -> String {
        concat!("twinalysis/", env!("CARGO_PKG_VERSION")).into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn page_size() -> u32 {
        super::MAX_PAGE_SIZE
    }

    // Credential defaults
    pub fn api_key_file() -> PathBuf {
        PathBuf::from("secrets/api")
    }
    pub fn api_secret_file() -> PathBuf {
        PathBuf::from("secrets/api_secret")
    }
    pub fn bearer_token_file() -> PathBuf {
        PathBuf::from("secrets/bearer")
    }

    // Cache defaults
    pub fn cache_root() -> PathBuf {
        PathBuf::from(".")
    }

    // Collector defaults
    pub fn max_concurrent() -> usize {
        8
    }
    pub fn stream_capacity() -> usize {
        10
    }
}

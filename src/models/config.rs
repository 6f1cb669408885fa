//! Application configuration structures.

use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};
use crate::services::fetcher::{Backoff, RetryPolicy};

/// Root application configuration.
///
/// Accepts both the TOML layout below and the flat JSON layout
/// `{"sendkeys": [...], "interval": 10, "fiterTge": true}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Push service keys, handed to the notifier as-is
    #[serde(default, alias = "sendkeys", alias = "sendKeys")]
    pub send_keys: Vec<String>,

    /// Minutes between checks in `watch` mode
    #[serde(
        default = "defaults::interval_minutes",
        alias = "interval",
        alias = "intervalMinutes"
    )]
    pub interval_minutes: u64,

    /// Drop token generation events before snapshotting
    #[serde(default, alias = "fiterTge", alias = "filterTge")]
    pub filter_tge: bool,

    /// Upstream API and retry settings
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Record window settings
    #[serde(default)]
    pub filter: FilterConfig,

    /// Snapshot persistence settings
    #[serde(default)]
    pub storage: StorageConfig,

    /// Push delivery settings
    #[serde(default)]
    pub notify: NotifyConfig,
}

impl Config {
    /// Load configuration from a JSON or TOML file, chosen by extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(serde_json::from_str(&content)?),
            Some("toml") => Ok(toml::from_str(&content)?),
            other => Err(AppError::config(format!(
                "Unsupported config format {:?} for {}",
                other,
                path.display()
            ))),
        }
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
        Url::parse(&self.fetch.base_url)
            .map_err(|e| AppError::validation(format!("fetch.base_url is invalid: {e}")))?;
        if self.fetch.timeout_secs == 0 {
            return Err(AppError::validation("fetch.timeout_secs must be > 0"));
        }
        if self.fetch.price_timeout_secs == 0 {
            return Err(AppError::validation("fetch.price_timeout_secs must be > 0"));
        }
        self.fetch.data.validate("fetch.data")?;
        self.fetch.price.validate("fetch.price")?;
        if self.filter.window_days < 0 {
            return Err(AppError::validation("filter.window_days must be >= 0"));
        }
        if self.interval_minutes == 0 {
            return Err(AppError::validation("interval_minutes must be > 0"));
        }
        if self.storage.snapshot_path.trim().is_empty() {
            return Err(AppError::validation("storage.snapshot_path is empty"));
        }
        if self.send_keys.iter().any(|k| k.trim().is_empty()) {
            return Err(AppError::validation("send_keys contains an empty key"));
        }
        Ok(())
    }

    /// Interval between checks in `watch` mode.
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_minutes * 60)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            send_keys: Vec::new(),
            interval_minutes: defaults::interval_minutes(),
            filter_tge: false,
            fetch: FetchConfig::default(),
            filter: FilterConfig::default(),
            storage: StorageConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

/// Upstream API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Scheme and host of the airdrop API
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Timeout for the data endpoint
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Timeout for the price endpoint
    #[serde(default = "defaults::price_timeout")]
    pub price_timeout_secs: u64,

    /// Retry budget for `/api/data`
    #[serde(default = "RetryConfig::data")]
    pub data: RetryConfig,

    /// Retry budget for `/api/price/<token>`
    #[serde(default = "RetryConfig::price")]
    pub price: RetryConfig,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            timeout_secs: defaults::timeout(),
            price_timeout_secs: defaults::price_timeout(),
            data: RetryConfig::data(),
            price: RetryConfig::price(),
        }
    }
}

/// Attempt budget and linear backoff, in seconds.
///
/// The delay after failed attempt `n` is `base + step * n`; 403 responses
/// use the `blocked_*` pair instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_attempts: u32,
    pub backoff_base_secs: u64,
    pub backoff_step_secs: u64,
    pub blocked_base_secs: u64,
    pub blocked_step_secs: u64,
}

impl RetryConfig {
    fn data() -> Self {
        Self::from(&RetryPolicy::data_endpoint())
    }

    fn price() -> Self {
        Self::from(&RetryPolicy::price_endpoint())
    }

    /// A 403 must never back off for less than any other failure.
    fn validate(&self, section: &str) -> Result<()> {
        if self.max_attempts == 0 {
            return Err(AppError::validation(format!(
                "{section}.max_attempts must be > 0"
            )));
        }
        if self.blocked_base_secs < self.backoff_base_secs
            || self.blocked_step_secs < self.backoff_step_secs
        {
            return Err(AppError::validation(format!(
                "{section}: blocked backoff must not be shorter than the normal backoff"
            )));
        }
        Ok(())
    }

    /// Convert into the fetcher's policy.
    pub fn policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            backoff: Backoff::linear(
                Duration::from_secs(self.backoff_base_secs),
                Duration::from_secs(self.backoff_step_secs),
            ),
            blocked_backoff: Backoff::linear(
                Duration::from_secs(self.blocked_base_secs),
                Duration::from_secs(self.blocked_step_secs),
            ),
        }
    }
}

impl From<&RetryPolicy> for RetryConfig {
    fn from(policy: &RetryPolicy) -> Self {
        Self {
            max_attempts: policy.max_attempts,
            backoff_base_secs: policy.backoff.base.as_secs(),
            backoff_step_secs: policy.backoff.step.as_secs(),
            blocked_base_secs: policy.blocked_backoff.base.as_secs(),
            blocked_step_secs: policy.blocked_backoff.step.as_secs(),
        }
    }
}

/// Record window settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Days ahead of today still considered relevant, inclusive
    #[serde(default = "defaults::window_days")]
    pub window_days: i64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            window_days: defaults::window_days(),
        }
    }
}

/// Snapshot persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "defaults::snapshot_path")]
    pub snapshot_path: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            snapshot_path: defaults::snapshot_path(),
        }
    }
}

/// Push delivery settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyConfig {
    /// Title of every pushed message
    #[serde(default = "defaults::title")]
    pub title: String,

    /// Pause after each key
    #[serde(default = "defaults::pacing_ms")]
    pub pacing_ms: u64,

    /// Overrides the push URL; `{key}` is replaced with the send key
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            title: defaults::title(),
            pacing_ms: defaults::pacing_ms(),
            endpoint: None,
        }
    }
}

mod defaults {
    pub fn interval_minutes() -> u64 {
        10
    }

    pub fn base_url() -> String {
        "https://alpha123.uk".to_string()
    }

    pub fn timeout() -> u64 {
        30
    }

    pub fn price_timeout() -> u64 {
        15
    }

    pub fn window_days() -> i64 {
        3
    }

    pub fn snapshot_path() -> String {
        "data/last_snapshot.txt".to_string()
    }

    pub fn title() -> String {
        "Today's Airdrops".to_string()
    }

    pub fn pacing_ms() -> u64 {
        1000
    }
}

//! Client configuration.
//!
//! Defaults suit a backend on `localhost:5000`. Every value can be
//! overridden through `CAPTIONEER_*` environment variables and then by CLI
//! flags.
//!
//! # Example
//!
//! ```ignore
//! use captioneer::config::{BatchStrategy, ClientConfig};
//!
//! let config = ClientConfig::from_env()
//!     .with_base_url("http://gpu-box:5000")
//!     .with_batch_strategy(BatchStrategy::Server);
//! ```

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

pub const ENV_BASE_URL: &str = "CAPTIONEER_BASE_URL";
pub const ENV_MAX_NEW_TOKENS: &str = "CAPTIONEER_MAX_NEW_TOKENS";
pub const ENV_RENDER_INTERVAL_MS: &str = "CAPTIONEER_RENDER_INTERVAL_MS";
pub const ENV_SPINNER_MIN_MS: &str = "CAPTIONEER_SPINNER_MIN_MS";
pub const ENV_TICKER_MS: &str = "CAPTIONEER_TICKER_MS";
pub const ENV_BATCH_STRATEGY: &str = "CAPTIONEER_BATCH_STRATEGY";
pub const ENV_CONNECT_TIMEOUT_SECS: &str = "CAPTIONEER_CONNECT_TIMEOUT_SECS";

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000";
pub const DEFAULT_MAX_NEW_TOKENS: u32 = 1024;
pub const MAX_NEW_TOKENS_LIMIT: u32 = 2048;

/// Configuration errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{name} must be a number, got '{value}'")]
    NotANumber { name: String, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: String,
        value: u64,
        min: u64,
        max: u64,
    },

    #[error("Invalid base URL '{0}': expected http:// or https://")]
    InvalidUrl(String),

    #[error("Unknown batch strategy '{0}': expected 'sequential' or 'server'")]
    UnknownStrategy(String),
}

/// How `runstream` handles several selected images.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchStrategy {
    /// One streaming request per image, in order
    #[default]
    Sequential,
    /// One request; the backend streams per-image progress and results
    Server,
}

impl BatchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStrategy::Sequential => "sequential",
            BatchStrategy::Server => "server",
        }
    }
}

impl fmt::Display for BatchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStrategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sequential" | "seq" => Ok(BatchStrategy::Sequential),
            "server" | "batch" => Ok(BatchStrategy::Server),
            _ => Err(ConfigError::UnknownStrategy(s.to_string())),
        }
    }
}

/// Parse an integer and check it against an inclusive range.
pub fn parse_bounded(name: &str, value: &str, min: u64, max: u64) -> Result<u64, ConfigError> {
    let parsed: u64 = value.trim().parse().map_err(|_| ConfigError::NotANumber {
        name: name.to_string(),
        value: value.to_string(),
    })?;
    if parsed < min || parsed > max {
        return Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value: parsed,
            min,
            max,
        });
    }
    Ok(parsed)
}

/// Validate a `max_new_tokens` value (1..=2048).
pub fn parse_max_new_tokens(value: &str) -> Result<u32, ConfigError> {
    parse_bounded("max_new_tokens", value, 1, MAX_NEW_TOKENS_LIMIT as u64).map(|v| v as u32)
}

/// Validate a base URL and strip trailing slashes.
pub fn parse_base_url(value: &str) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(ConfigError::InvalidUrl(value.to_string()));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

/// Client configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL, without trailing slash
    pub base_url: String,
    /// Sent as `max_new_tokens` on image requests
    pub max_new_tokens: u32,
    /// Throttle window for incremental renders
    pub render_interval: Duration,
    /// Minimum time the spinner stays visible once shown
    pub spinner_min_visible: Duration,
    /// Status ticker period
    pub ticker_interval: Duration,
    /// Strategy for streaming several images
    pub batch_strategy: BatchStrategy,
    /// Timeout for establishing a connection; bodies are read without a deadline
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_new_tokens: DEFAULT_MAX_NEW_TOKENS,
            render_interval: Duration::from_millis(80),
            spinner_min_visible: Duration::from_millis(500),
            ticker_interval: Duration::from_millis(500),
            batch_strategy: BatchStrategy::Sequential,
            connect_timeout: Duration::from_secs(30),
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_new_tokens(mut self, tokens: u32) -> Self {
        self.max_new_tokens = tokens;
        self
    }

    pub fn with_render_interval(mut self, interval: Duration) -> Self {
        self.render_interval = interval;
        self
    }

    pub fn with_spinner_min_visible(mut self, min: Duration) -> Self {
        self.spinner_min_visible = min;
        self
    }

    pub fn with_ticker_interval(mut self, interval: Duration) -> Self {
        self.ticker_interval = interval;
        self
    }

    pub fn with_batch_strategy(mut self, strategy: BatchStrategy) -> Self {
        self.batch_strategy = strategy;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Build config from `CAPTIONEER_*` environment variables.
    ///
    /// Invalid values are logged and the default is kept.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup(ENV_BASE_URL) {
            match parse_base_url(&value) {
                Ok(url) => config.base_url = url,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_BASE_URL, e),
            }
        }

        if let Some(value) = lookup(ENV_MAX_NEW_TOKENS) {
            match parse_max_new_tokens(&value) {
                Ok(tokens) => config.max_new_tokens = tokens,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_MAX_NEW_TOKENS, e),
            }
        }

        let millis = |name: &str, min: u64, max: u64| -> Option<Duration> {
            let value = lookup(name)?;
            match parse_bounded(name, &value, min, max) {
                Ok(ms) => Some(Duration::from_millis(ms)),
                Err(e) => {
                    tracing::warn!("Ignoring {}: {}", name, e);
                    None
                }
            }
        };

        if let Some(interval) = millis(ENV_RENDER_INTERVAL_MS, 1, 10_000) {
            config.render_interval = interval;
        }
        if let Some(min) = millis(ENV_SPINNER_MIN_MS, 0, 10_000) {
            config.spinner_min_visible = min;
        }
        if let Some(interval) = millis(ENV_TICKER_MS, 10, 60_000) {
            config.ticker_interval = interval;
        }

        if let Some(value) = lookup(ENV_BATCH_STRATEGY) {
            match value.parse() {
                Ok(strategy) => config.batch_strategy = strategy,
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_BATCH_STRATEGY, e),
            }
        }

        if let Some(value) = lookup(ENV_CONNECT_TIMEOUT_SECS) {
            match parse_bounded(ENV_CONNECT_TIMEOUT_SECS, &value, 1, 3_600) {
                Ok(secs) => config.connect_timeout = Duration::from_secs(secs),
                Err(e) => tracing::warn!("Ignoring {}: {}", ENV_CONNECT_TIMEOUT_SECS, e),
            }
        }

        config
    }
}

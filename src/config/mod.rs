//! Configuration management for the doffin scraper
//!
//! This module handles loading and validating configuration from environment variables
//! and TOML files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::utils::is_http_url;
use crate::utils::retry::RetryPolicy;

/// Default public site
pub const DEFAULT_BASE_URL: &str = "https://doffin.no";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Scraper configuration
    pub scraper: ScraperConfig,

    /// Retry and backoff configuration
    pub retry: RetryPolicy,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Scraper-specific configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    /// Site root used for search and notice URLs
    pub base_url: String,

    /// Identifying user agent with contact information
    pub user_agent: String,

    /// Minimum gap between two physical requests in milliseconds
    pub min_interval_ms: u64,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: String::from(DEFAULT_BASE_URL),
            user_agent: default_user_agent(),
            min_interval_ms: 1000,
            request_timeout_secs: 30,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

/// User agent sent when none is configured
pub fn default_user_agent() -> String {
    format!(
        "doffin-scraper/{} (+contact@example.com)",
        env!("CARGO_PKG_VERSION")
    )
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// Every variable is optional and unset values keep their defaults.
    ///
    /// # Errors
    ///
    /// Fails if a numeric variable is set to something that is not a number.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Ok(user_agent) = std::env::var("DOFFIN_USER_AGENT") {
            config.scraper.user_agent = user_agent;
        }

        if let Ok(base_url) = std::env::var("DOFFIN_BASE_URL") {
            config.scraper.base_url = base_url;
        }

        if let Some(ms) = env_parse::<u64>("DOFFIN_MIN_INTERVAL_MS")? {
            config.scraper.min_interval_ms = ms;
        }

        if let Some(secs) = env_parse::<u64>("DOFFIN_REQUEST_TIMEOUT")? {
            config.scraper.request_timeout_secs = secs;
        }

        if let Some(attempts) = env_parse::<u32>("DOFFIN_MAX_ATTEMPTS")? {
            config.retry.max_attempts = attempts;
        }

        if let Ok(level) = std::env::var("DOFFIN_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Ok(format) = std::env::var("DOFFIN_LOG_FORMAT") {
            config.logging.format = format;
        }

        Ok(config)
    }

    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.scraper.user_agent.trim().is_empty() {
            anyhow::bail!("user_agent must not be empty");
        }

        if !is_http_url(&self.scraper.base_url) {
            anyhow::bail!(
                "base_url must be an absolute http(s) URL: {}",
                self.scraper.base_url
            );
        }

        if self.scraper.request_timeout_secs == 0 {
            anyhow::bail!("request_timeout_secs must be greater than 0");
        }

        if self.retry.max_attempts == 0 {
            anyhow::bail!("max_attempts must be at least 1");
        }

        if self.retry.backoff_factor.is_nan() || self.retry.backoff_factor < 1.0 {
            anyhow::bail!("backoff_factor must be >= 1.0");
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            anyhow::bail!("base_delay_ms must not exceed max_delay_ms");
        }

        if !matches!(self.logging.format.as_str(), "text" | "json") {
            anyhow::bail!("log format must be 'text' or 'json'");
        }

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.scraper.request_timeout_secs)
    }

    /// Get the pacing interval as Duration
    #[must_use]
    pub fn min_interval(&self) -> Duration {
        Duration::from_millis(self.scraper.min_interval_ms)
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>> {
    parse_env_value(key, std::env::var(key).ok())
}

fn parse_env_value<T: std::str::FromStr>(key: &str, raw: Option<String>) -> Result<Option<T>> {
    match raw {
        None => Ok(None),
        Some(value) => match value.trim().parse::<T>() {
            Ok(parsed) => Ok(Some(parsed)),
            Err(_) => anyhow::bail!("{key} must be a number, got '{value}'"),
        },
    }
}

//! Runtime config: token, API base, polling cadence. Loaded from env.

use std::env;
use std::time::Duration;

use crate::error::{BotError, Result};

/// Polling and transport configuration. Every knob has a default except the
/// bot token. The steady-state poll interval and the retry backoff are
/// separate values on purpose: the first paces healthy fetches, the second
/// spaces re-attempts after a failed one.
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// BOT_TOKEN
    pub token: String,
    /// TELEGRAM_API_URL
    pub api_url: String,
    /// POLL_LIMIT: max updates per fetch (1..=100)
    pub limit: u32,
    /// POLL_TIMEOUT_SECS: long-poll server-side wait, seconds
    pub timeout: u64,
    /// POLL_INTERVAL_MS: steady-state tick cadence
    pub poll_interval_ms: u64,
    /// RETRY_TIMEOUT_MS: spacing between attempts after a failed fetch
    pub retry_timeout_ms: u64,
    /// LOG_FILE: optional log file the console output is teed to
    pub log_file: Option<String>,
}

impl BotConfig {
    /// Load from environment variables. `token` overrides BOT_TOKEN if provided.
    pub fn load(token: Option<String>) -> Result<Self> {
        let token = token
            .or_else(|| env::var("BOT_TOKEN").ok())
            .ok_or_else(|| BotError::Config("BOT_TOKEN not set".to_string()))?;
        let api_url = env::var("TELEGRAM_API_URL")
            .unwrap_or_else(|_| "https://api.telegram.org".to_string());
        let limit = env::var("POLL_LIMIT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(100);
        let timeout = env::var("POLL_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0);
        let poll_interval_ms = env::var("POLL_INTERVAL_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(1000);
        let retry_timeout_ms = env::var("RETRY_TIMEOUT_MS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(5000);
        let log_file = env::var("LOG_FILE").ok();

        Ok(Self {
            token,
            api_url,
            limit,
            timeout,
            poll_interval_ms,
            retry_timeout_ms,
            log_file,
        })
    }

    /// Validate config: api_url must parse as a URL, limit must be 1..=100.
    pub fn validate(&self) -> Result<()> {
        if reqwest::Url::parse(&self.api_url).is_err() {
            return Err(BotError::Config(format!(
                "TELEGRAM_API_URL is not a valid URL: {}",
                self.api_url
            )));
        }
        if self.limit == 0 || self.limit > 100 {
            return Err(BotError::Config(format!(
                "POLL_LIMIT must be between 1 and 100, got {}",
                self.limit
            )));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn retry_timeout(&self) -> Duration {
        Duration::from_millis(self.retry_timeout_ms)
    }
}

//! Construction-time configuration for [`PredictionClient`](super::PredictionClient).

use std::time::Duration;

/// Default prediction API endpoint.
pub const DEFAULT_BASE_URL: &str = "https://replicate.com/api/models";

/// Default delay between polls and between retry attempts, in milliseconds.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 250;

/// Default number of attempts per HTTP call.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Configuration for the prediction client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// Delay between polls, also used between retry attempts.
    pub poll_interval_ms: u64,
    /// Total attempts per HTTP call, including the first.
    pub max_retries: u32,
    /// Sent as `Authorization: Bearer <token>` when set.
    pub api_token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
            api_token: None,
        }
    }
}

impl ClientConfig {
    /// Set the base URL. A trailing slash is dropped.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the poll and retry interval in milliseconds.
    pub fn with_poll_interval(mut self, ms: u64) -> Self {
        self.poll_interval_ms = ms;
        self
    }

    /// Set the number of attempts per HTTP call.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the bearer token.
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

//! Persisted settings for the prediction-client CLI.
//! Stored in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::api::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_POLL_INTERVAL_MS};

/// CLI settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Prediction API base URL
    pub base_url: String,
    /// Bearer token (empty for none)
    pub api_token: String,
    /// Poll and retry interval in milliseconds
    pub poll_interval_ms: u64,
    /// Attempts per HTTP call
    pub max_retries: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_token: String::new(),
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "moderras", "prediction-client")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        let defaults = Self::default();

        let mut loaded: Self = Self::settings_path()
            .and_then(|path| fs::read_to_string(&path).ok())
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        // Backfill fields blanked out in older config files
        if loaded.base_url.is_empty() {
            loaded.base_url = defaults.base_url;
        }
        if loaded.poll_interval_ms == 0 {
            loaded.poll_interval_ms = defaults.poll_interval_ms;
        }

        loaded
    }

    /// Save settings to the config file.
    pub fn save(&self) -> Result<PathBuf, String> {
        let dir = Self::config_dir().ok_or("Cannot determine config directory")?;

        fs::create_dir_all(&dir)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;

        let path = dir.join("settings.json");
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(&path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(path)
    }

    /// Override settings from `PREDICTION_*` environment variables.
    pub fn apply_env(self) -> Self {
        self.apply_vars(|key| env::var(key).ok())
    }

    fn apply_vars(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = var("PREDICTION_BASE_URL") {
            self.base_url = url;
        }
        if let Some(token) = var("PREDICTION_API_TOKEN") {
            self.api_token = token;
        }
        if let Some(ms) = var("PREDICTION_POLL_INTERVAL_MS").and_then(|s| s.parse().ok()) {
            self.poll_interval_ms = ms;
        }
        if let Some(n) = var("PREDICTION_MAX_RETRIES").and_then(|s| s.parse().ok()) {
            self.max_retries = n;
        }
        self
    }

    /// Build the client configuration these settings describe.
    pub fn client_config(&self) -> ClientConfig {
        let config = ClientConfig::default()
            .with_base_url(&self.base_url)
            .with_poll_interval(self.poll_interval_ms)
            .with_max_retries(self.max_retries);

        if self.api_token.is_empty() {
            config
        } else {
            config.with_api_token(&self.api_token)
        }
    }
}

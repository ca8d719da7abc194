//! Completion client configuration.

use sensei_core::error::{Result, SenseiError};
use std::env;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1/chat/completions";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Configuration for the HTTP completion client.
#[derive(Debug, Clone)]
pub struct CompletionConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl CompletionConfig {
    /// Creates a config with defaults for everything but the API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Loads configuration from environment variables.
    ///
    /// `SENSEI_API_KEY` is required; `SENSEI_MODEL_NAME`,
    /// `SENSEI_API_BASE_URL`, and `SENSEI_COMPLETION_TIMEOUT_SECS` override
    /// the defaults.
    pub fn try_from_env() -> Result<Self> {
        let api_key = env::var("SENSEI_API_KEY").map_err(|_| {
            SenseiError::completion_unavailable("SENSEI_API_KEY not found in environment variables")
        })?;

        let mut config = Self::new(api_key);
        if let Ok(model) = env::var("SENSEI_MODEL_NAME") {
            config.model = model;
        }
        if let Ok(base_url) = env::var("SENSEI_API_BASE_URL") {
            config.base_url = base_url;
        }
        if let Ok(secs) = env::var("SENSEI_COMPLETION_TIMEOUT_SECS") {
            if let Ok(secs) = secs.parse::<u64>() {
                config.timeout = Duration::from_secs(secs);
            }
        }

        Ok(config)
    }

    /// Overrides the model after construction.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Overrides the completion timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

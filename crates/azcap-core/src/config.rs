//! Engine configuration: consumed by the engine, owned by the caller.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::classify::ColorThresholds;
use crate::error::ConfigError;
use crate::retry::{Backoff, RetryConfig};

fn default_api_version() -> String {
    String::from("2024-10-01")
}

fn default_base_url() -> String {
    String::from("https://management.azure.com")
}

fn default_cache_ttl() -> u64 {
    300
}

/// One model to query capacity for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    pub model_format: String,
    pub model_name: String,
    pub model_version: String,
}

/// Retry policy knobs, in the shape the configuration file uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_retries: u32,
    pub base_delay_seconds: f64,
    pub max_delay_seconds: f64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_seconds: 1.0,
            max_delay_seconds: 30.0,
        }
    }
}

impl RetrySettings {
    pub fn to_retry_config(self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            backoff: Backoff {
                base: Duration::from_secs_f64(self.base_delay_seconds),
                max: Duration::from_secs_f64(self.max_delay_seconds),
                ..Backoff::default()
            },
        }
    }
}

/// Full engine configuration, matching the JSON configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    pub subscription_id: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub models: Vec<ModelSpec>,
    #[serde(default)]
    pub retry: RetrySettings,
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_seconds: u64,
    #[serde(default)]
    pub color_thresholds: ColorThresholds,
}

impl EngineConfig {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.subscription_id.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "subscription_id",
            });
        }
        if self.api_version.trim().is_empty() {
            return Err(ConfigError::MissingField {
                field: "api_version",
            });
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::MissingField { field: "base_url" });
        }
        if self.models.is_empty() {
            return Err(ConfigError::NoModels);
        }
        for model in &self.models {
            if model.model_name.trim().is_empty() {
                return Err(ConfigError::MissingField { field: "model_name" });
            }
        }
        if self.retry.base_delay_seconds <= 0.0
            || self.retry.max_delay_seconds < self.retry.base_delay_seconds
        {
            return Err(ConfigError::InvalidRetrySettings);
        }
        self.color_thresholds.validate()?;
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }
}

use anyhow::{anyhow, bail, Result};
use serde::Deserialize;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::poller::PollConfig;
use crate::utils::RetryPolicy;

/// Video durations (seconds) accepted by the generation endpoint.
pub const SUPPORTED_DURATIONS: [u32; 2] = [5, 8];

pub const DEFAULT_PIXVERSE_BASE_URL: &str = "https://app-api.pixverse.ai/openapi/v2";
pub const DEFAULT_PROMPT: &str = "2 people are there in the image make them smooch";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub pixverse: PixVerseConfig,
    pub polling: PollingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
    pub cors_allowed_origins: Vec<String>,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
}

#[derive(Clone, Deserialize)]
pub struct PixVerseConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub motion_mode: String,
    pub quality: String,
    pub duration: u32,
    pub default_prompt: String,
    pub request_timeout_secs: u64,
    pub status_retries: u32,
    pub retry_base_ms: u64,
}

// Keeps the API key out of logs.
impl std::fmt::Debug for PixVerseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixVerseConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("motion_mode", &self.motion_mode)
            .field("quality", &self.quality)
            .field("duration", &self.duration)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("status_retries", &self.status_retries)
            .finish()
    }
}

impl PixVerseConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.status_retries, Duration::from_millis(self.retry_base_ms))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_ms: u64,
    pub max_attempts: u32,
}

impl PollingConfig {
    pub fn poll_config(&self) -> Result<PollConfig> {
        Ok(PollConfig::from_millis(self.interval_ms, self.max_attempts)?)
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let config = Self {
            server: ServerConfig {
                port: var("PORT", "3000").parse()?,
                host: var("HOST", "0.0.0.0"),
                cors_allowed_origins: var("ALLOWED_ORIGINS", "*")
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                upload_dir: PathBuf::from(var("UPLOAD_DIR", "uploads")),
                max_upload_bytes: var("MAX_UPLOAD_BYTES", "10485760").parse()?,
            },
            pixverse: PixVerseConfig {
                api_key: lookup("PIXVERSE_API_KEY")
                    .filter(|k| !k.is_empty())
                    .ok_or_else(|| anyhow!("PIXVERSE_API_KEY must be set"))?,
                base_url: var("PIXVERSE_BASE_URL", DEFAULT_PIXVERSE_BASE_URL)
                    .trim_end_matches('/')
                    .to_string(),
                model: var("PIXVERSE_MODEL", "v3.5"),
                motion_mode: var("PIXVERSE_MOTION_MODE", "normal"),
                quality: var("PIXVERSE_QUALITY", "540p"),
                duration: var("PIXVERSE_DURATION", "5").parse()?,
                default_prompt: var("DEFAULT_PROMPT", DEFAULT_PROMPT),
                request_timeout_secs: var("PIXVERSE_REQUEST_TIMEOUT_SECS", "30").parse()?,
                status_retries: var("PIXVERSE_STATUS_RETRIES", "2").parse()?,
                retry_base_ms: var("PIXVERSE_RETRY_BASE_MS", "500").parse()?,
            },
            polling: PollingConfig {
                interval_ms: var("POLL_INTERVAL_MS", "5000").parse()?,
                max_attempts: var("POLL_MAX_ATTEMPTS", "20").parse()?,
            },
        };

        if !SUPPORTED_DURATIONS.contains(&config.pixverse.duration) {
            bail!(
                "PIXVERSE_DURATION must be one of {:?}, got {}",
                SUPPORTED_DURATIONS,
                config.pixverse.duration
            );
        }
        config.polling.poll_config()?;

        Ok(config)
    }
}

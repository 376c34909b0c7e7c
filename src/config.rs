//! Configuration types for async-http-get

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What to do when a 200 response carries no `Content-Length` header
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MissingLengthPolicy {
    /// Read until the server closes the connection (default)
    ///
    /// Requests are sent with `Connection: close`, so end of stream marks the
    /// end of the body. Bounded by [`Config::max_body_bytes`].
    #[default]
    ReadToEnd,
    /// Fail the download with [`Error::MissingContentLength`]
    Fail,
}

/// Main configuration for [`HttpDownloader`](crate::HttpDownloader)
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Port used for the HTTP service (default: 80)
    #[serde(default = "default_port")]
    pub port: u16,

    /// Limit for each individual connect attempt (default: 10 seconds)
    ///
    /// A timed-out attempt counts as a failed candidate and the next resolved
    /// endpoint is tried.
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Limit for name resolution, the request write and each read (default: 30 seconds)
    #[serde(default = "default_io_timeout", with = "duration_serde")]
    pub io_timeout: Duration,

    /// Handling of responses without `Content-Length`
    #[serde(default)]
    pub missing_length: MissingLengthPolicy,

    /// Maximum body size accepted when reading to end of stream (None = unlimited)
    #[serde(default)]
    pub max_body_bytes: Option<u64>,

    /// Retry behavior for [`HttpDownloader::download_with_retry`](crate::HttpDownloader::download_with_retry)
    #[serde(default)]
    pub retry: RetryConfig,

    /// Capacity of the event broadcast channel (default: 64)
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: default_port(),
            connect_timeout: default_connect_timeout(),
            io_timeout: default_io_timeout(),
            missing_length: MissingLengthPolicy::default(),
            max_body_bytes: None,
            retry: RetryConfig::default(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl Config {
    /// Check settings that would make every download fail
    pub fn validate(&self) -> Result<()> {
        if self.port == 0 {
            return Err(config_error("port must be non-zero", "port"));
        }
        if self.connect_timeout.is_zero() {
            return Err(config_error(
                "connect_timeout must be non-zero",
                "connect_timeout",
            ));
        }
        if self.io_timeout.is_zero() {
            return Err(config_error("io_timeout must be non-zero", "io_timeout"));
        }
        if self.event_capacity == 0 {
            return Err(config_error(
                "event_capacity must be at least 1",
                "event_capacity",
            ));
        }
        let multiplier = self.retry.backoff_multiplier;
        if !multiplier.is_finite() || multiplier < 1.0 {
            return Err(config_error(
                "backoff_multiplier must be a finite number >= 1.0",
                "retry.backoff_multiplier",
            ));
        }
        Ok(())
    }
}

fn config_error(message: &str, key: &str) -> Error {
    Error::Config {
        message: message.to_string(),
        key: Some(key.to_string()),
    }
}

/// Retry configuration for transient failures
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try (default: 3)
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Initial delay before first retry (default: 1 second)
    #[serde(default = "default_initial_delay", with = "duration_serde")]
    pub initial_delay: Duration,

    /// Maximum delay between retries (default: 30 seconds)
    #[serde(default = "default_max_delay", with = "duration_serde")]
    pub max_delay: Duration,

    /// Multiplier for exponential backoff (default: 2.0)
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,

    /// Add random jitter to delays (default: true)
    #[serde(default = "default_true")]
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
            max_delay: default_max_delay(),
            backoff_multiplier: default_backoff_multiplier(),
            jitter: true,
        }
    }
}

fn default_port() -> u16 {
    80
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_io_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_event_capacity() -> usize {
    64
}

fn default_true() -> bool {
    true
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> Duration {
    Duration::from_secs(1)
}

fn default_max_delay() -> Duration {
    Duration::from_secs(30)
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

// Duration serialization helper (whole seconds)
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

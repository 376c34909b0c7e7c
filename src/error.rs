//! Error types for async-http-get
//!
//! Every failure aborts the download it happened in. The variants follow the
//! suspension points of a download: resolution, connection, protocol
//! validation, status check and byte transfer. Each error also exposes a
//! short machine-readable code (see [`Error::error_code`]) which is carried in
//! [`Event::Failed`](crate::types::Event::Failed).

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Result type alias for async-http-get operations
pub type Result<T> = std::result::Result<T, Error>;

/// Suspension point at which an I/O step was running
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Hostname lookup
    Resolve,
    /// Connect attempt to one resolved endpoint
    Connect,
    /// Request transmission
    Write,
    /// Reading up to the end of the status line
    StatusLine,
    /// Reading up to the end of the header block
    Headers,
    /// Reading the response body
    Body,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Stage::Resolve => "name resolution",
            Stage::Connect => "connect",
            Stage::Write => "request write",
            Stage::StatusLine => "status line read",
            Stage::Headers => "header read",
            Stage::Body => "body read",
        };
        f.write_str(name)
    }
}

/// Main error type for async-http-get
#[derive(Debug, Error)]
pub enum Error {
    /// Hostname lookup failed or returned no addresses
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        /// Hostname that was looked up
        host: String,
        /// Underlying lookup error
        #[source]
        source: std::io::Error,
    },

    /// Every resolved endpoint refused or was unreachable
    #[error("failed to connect to {host} after {attempts} attempt(s): {source}")]
    Connect {
        /// Hostname whose endpoints were tried
        host: String,
        /// Number of endpoints attempted
        attempts: usize,
        /// Error from the last attempt
        #[source]
        source: std::io::Error,
    },

    /// Malformed status line, version prefix mismatch or bad header value
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Server answered with a status other than 200
    #[error("bad status code: {code} {message}")]
    BadStatus {
        /// Numeric status code from the status line
        code: u32,
        /// Status message from the status line
        message: String,
    },

    /// Connection closed before a delimiter or the requested byte count arrived
    #[error("connection closed during {stage} after {received} bytes")]
    Transfer {
        /// Step that was reading when the peer closed
        stage: Stage,
        /// Number of bytes the step needed, when known
        expected: Option<u64>,
        /// Number of bytes the step received before the close
        received: u64,
    },

    /// A suspension point did not complete within its configured limit
    #[error("{stage} timed out after {after:?}")]
    Timeout {
        /// Step that stalled
        stage: Stage,
        /// Configured limit that elapsed
        after: Duration,
    },

    /// Response carried no Content-Length and the policy requires one
    #[error("response has no Content-Length header")]
    MissingContentLength,

    /// Body grew past the configured limit while reading to end of stream
    #[error("response body exceeds limit of {limit} bytes")]
    BodyTooLarge {
        /// Configured maximum body size
        limit: u64,
    },

    /// Download was cancelled through its task handle
    #[error("download cancelled")]
    Cancelled,

    /// URL could not be turned into a host and path
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "io_timeout")
        key: Option<String>,
    },

    /// Spawned download task panicked
    #[error("download task failed: {0}")]
    Task(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Resolve { .. } => "resolve_failed",
            Error::Connect { .. } => "connect_failed",
            Error::InvalidResponse(_) => "invalid_response",
            Error::BadStatus { .. } => "bad_status",
            Error::Transfer { .. } => "transfer_failed",
            Error::Timeout { .. } => "timeout",
            Error::MissingContentLength => "missing_content_length",
            Error::BodyTooLarge { .. } => "body_too_large",
            Error::Cancelled => "cancelled",
            Error::InvalidUrl(_) => "invalid_url",
            Error::Config { .. } => "config_error",
            Error::Task(_) => "task_failed",
            Error::Io(_) => "io_error",
        }
    }

    /// Step the error happened in, if it is tied to one
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Error::Resolve { .. } => Some(Stage::Resolve),
            Error::Connect { .. } => Some(Stage::Connect),
            Error::BadStatus { .. } => Some(Stage::StatusLine),
            Error::Transfer { stage, .. } | Error::Timeout { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

//! Core types for async-http-get

use crate::buffer::ResponseBuffer;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Status line and the one header field this client interprets
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseHead {
    /// Version token, always starting with `HTTP/`
    pub version: String,
    /// Numeric status code (always 200 once the handshake succeeds)
    pub status: u32,
    /// Status message following the code, trimmed
    pub message: String,
    /// Value of `Content-Length`, `None` when the header is absent
    pub content_length: Option<u64>,
}

/// Result of a spawned download: the parsed head plus the buffer it filled
#[derive(Clone, Debug)]
pub struct CompletedDownload {
    /// Parsed status line and content length
    pub head: ResponseHead,
    /// Header block followed by the full body
    pub buffer: ResponseBuffer,
}

impl CompletedDownload {
    /// Body bytes of the response
    pub fn body(&self) -> &[u8] {
        self.buffer.body()
    }
}

/// Event emitted during a download
///
/// Subscribe with [`HttpDownloader::subscribe`](crate::HttpDownloader::subscribe).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Hostname resolved to a candidate list
    Resolved {
        /// Hostname that was looked up
        host: String,
        /// Number of candidate endpoints, in resolution order
        candidates: usize,
    },

    /// One connect attempt failed; the next candidate will be tried
    ConnectFailed {
        /// Endpoint that could not be reached
        addr: SocketAddr,
        /// Error message of the failed attempt
        error: String,
    },

    /// Connection established
    Connected {
        /// Endpoint the connection is bound to
        addr: SocketAddr,
    },

    /// Status line and headers parsed
    HeadersReceived {
        /// Status code from the status line
        status: u32,
        /// Parsed `Content-Length`, if present
        content_length: Option<u64>,
    },

    /// Download finished with the full body buffered
    Completed {
        /// Requested host
        host: String,
        /// Requested path
        path: String,
        /// Number of body bytes
        bytes: u64,
    },

    /// Download failed
    Failed {
        /// Requested host
        host: String,
        /// Requested path
        path: String,
        /// Machine-readable error code
        code: String,
        /// Error message
        error: String,
    },
}

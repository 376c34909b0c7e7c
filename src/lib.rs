//! # async-http-get
//!
//! Single-connection asynchronous HTTP/1.0 GET client.
//!
//! A download is one suspendable unit of work running on tokio. It resolves a
//! hostname, connects to the first resolved endpoint that accepts, sends a
//! minimal `GET` request with `Connection: close`, validates the status line,
//! locates `Content-Length` in the header block and then reads exactly that
//! many body bytes. Every I/O step is an `.await` point; nothing blocks the
//! runtime thread.
//!
//! ## Design Philosophy
//!
//! - **Caller-owned buffers** - the response lands in a [`ResponseBuffer`]
//!   the caller lends to the download; bytes are only ever appended
//! - **Explicit failover** - resolved endpoints are tried strictly in order,
//!   each attempt yielding a typed result that is logged and broadcast
//! - **No partial success** - a download either ends with a validated head
//!   and a body matching its length, or fails with an [`Error`]
//! - **Pluggable network** - the [`Transport`] trait separates the protocol
//!   logic from sockets and DNS
//!
//! ## Quick Start
//!
//! ```no_run
//! use async_http_get::{Config, HttpDownloader, ResponseBuffer};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = HttpDownloader::new(Config::default())?;
//!
//!     // Subscribe to events
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let mut buffer = ResponseBuffer::new();
//!     let head = downloader.download("example.com", "/", &mut buffer).await?;
//!     println!("{:?}: {} body bytes", head.content_length, buffer.body().len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Append-only response buffer
pub mod buffer;
/// Downloader, handshake and spawned tasks
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Suspending stream helpers
mod io;
/// HTTP/1.0 wire format
pub mod protocol;
/// Retry logic with exponential backoff
pub mod retry;
/// Name resolution and connection seam
pub mod transport;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use buffer::ResponseBuffer;
pub use client::{DownloadTask, HttpDownloader};
pub use config::{Config, MissingLengthPolicy, RetryConfig};
pub use error::{Error, Result, Stage};
pub use transport::{TokioTransport, Transport};
pub use types::{CompletedDownload, Event, ResponseHead};

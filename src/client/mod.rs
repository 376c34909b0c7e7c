//! HTTP GET downloader split into focused submodules.
//!
//! The `HttpDownloader` struct and its methods are organized by phase:
//! - [`handshake`] - Resolve, connect with failover, request, status line and headers
//! - [`body`] - Reading the remaining body bytes once the head is parsed
//! - [`task`] - Spawned, named, cancellable downloads

mod body;
mod handshake;
mod task;


pub use task::DownloadTask;

use std::sync::Arc;

use crate::buffer::ResponseBuffer;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::transport::{TokioTransport, Transport};
use crate::types::{CompletedDownload, Event, ResponseHead};

/// Single-connection HTTP/1.0 GET client
///
/// Each download resolves the host, connects to the first reachable
/// endpoint, sends one GET request and reads the response into a
/// caller-owned [`ResponseBuffer`]. Connections are never reused. Cloning is
/// cheap; clones share the transport, configuration and event channel.
pub struct HttpDownloader<T: Transport = TokioTransport> {
    pub(crate) transport: Arc<T>,
    pub(crate) config: Arc<Config>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
}

impl<T: Transport> Clone for HttpDownloader<T> {
    fn clone(&self) -> Self {
        Self {
            transport: Arc::clone(&self.transport),
            config: Arc::clone(&self.config),
            event_tx: self.event_tx.clone(),
        }
    }
}

impl HttpDownloader<TokioTransport> {
    /// Create a downloader using the system resolver and TCP sockets
    ///
    /// # Example
    ///
    /// ```no_run
    /// use async_http_get::{Config, HttpDownloader, ResponseBuffer};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = HttpDownloader::new(Config::default())?;
    ///
    ///     let mut buffer = ResponseBuffer::new();
    ///     let head = downloader.download("example.com", "/", &mut buffer).await?;
    ///     println!("{} {} ({} bytes)", head.status, head.message, buffer.body().len());
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn new(config: Config) -> Result<Self> {
        Self::with_transport(config, TokioTransport)
    }
}

impl<T: Transport> HttpDownloader<T> {
    /// Create a downloader on top of a custom [`Transport`]
    pub fn with_transport(config: Config, transport: T) -> Result<Self> {
        config.validate()?;
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_capacity);

        Ok(Self {
            transport: Arc::new(transport),
            config: Arc::new(config),
            event_tx,
        })
    }

    /// Subscribe to download events
    ///
    /// Events sent before subscribing are not replayed. A slow subscriber
    /// that falls more than `event_capacity` events behind sees a `Lagged`
    /// error from the receiver.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers the event is dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }

    /// Download `path` from `host` into `buffer`
    ///
    /// On success the buffer holds the status line, the header block and
    /// the full body, and [`ResponseBuffer::body`] returns exactly the body.
    /// On failure the buffer keeps whatever arrived before the error.
    pub async fn download(
        &self,
        host: &str,
        path: &str,
        buffer: &mut ResponseBuffer,
    ) -> Result<ResponseHead> {
        self.fetch(host, self.config.port, path, buffer).await
    }

    /// Download an `http://` URL into `buffer`
    ///
    /// The port comes from the URL, or 80 when the URL has none. The query
    /// string, if any, is sent as part of the request path.
    pub async fn download_url(
        &self,
        url: &str,
        buffer: &mut ResponseBuffer,
    ) -> Result<ResponseHead> {
        let url = url::Url::parse(url).map_err(|e| Error::InvalidUrl(e.to_string()))?;
        if url.scheme() != "http" {
            return Err(Error::InvalidUrl(format!(
                "unsupported scheme {:?}",
                url.scheme()
            )));
        }

        let host = url
            .host_str()
            .ok_or_else(|| Error::InvalidUrl(format!("{url} has no host")))?
            .trim_start_matches('[')
            .trim_end_matches(']');
        let port = url.port_or_known_default().unwrap_or(self.config.port);
        let path = match url.query() {
            Some(query) => format!("{}?{}", url.path(), query),
            None => url.path().to_string(),
        };

        self.fetch(host, port, &path, buffer).await
    }

    /// Download with exponential backoff on transient failures
    ///
    /// Every attempt starts over with a fresh connection and a fresh buffer.
    /// Retry behavior comes from [`Config::retry`].
    pub async fn download_with_retry(&self, host: &str, path: &str) -> Result<CompletedDownload> {
        crate::retry::download_with_retry(&self.config.retry, || async move {
            let mut buffer = ResponseBuffer::new();
            let head = self.download(host, path, &mut buffer).await?;
            Ok(CompletedDownload { head, buffer })
        })
        .await
    }

    async fn fetch(
        &self,
        host: &str,
        port: u16,
        path: &str,
        buffer: &mut ResponseBuffer,
    ) -> Result<ResponseHead> {
        match self.run_download(host, port, path, buffer).await {
            Ok((head, bytes)) => {
                tracing::info!(host, path, bytes, "Download complete");
                self.emit_event(Event::Completed {
                    host: host.to_string(),
                    path: path.to_string(),
                    bytes,
                });
                Ok(head)
            }
            Err(e) => {
                tracing::error!(host, path, error = %e, "Download failed");
                self.emit_event(Event::Failed {
                    host: host.to_string(),
                    path: path.to_string(),
                    code: e.error_code().to_string(),
                    error: e.to_string(),
                });
                Err(e)
            }
        }
    }

    /// The connection lives only for the duration of this call
    async fn run_download(
        &self,
        host: &str,
        port: u16,
        path: &str,
        buffer: &mut ResponseBuffer,
    ) -> Result<(ResponseHead, u64)> {
        let (mut stream, head) = self.handshake_on(host, port, path, buffer).await?;
        let bytes = body::read_body(&mut stream, &head, buffer, &self.config).await?;
        Ok((head, bytes))
    }
}

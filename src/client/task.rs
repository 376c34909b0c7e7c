//! Spawned downloads: one named, cancellable unit of work per download.

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::buffer::ResponseBuffer;
use crate::error::{Error, Result};
use crate::transport::Transport;
use crate::types::{CompletedDownload, Event, ResponseHead};

use super::HttpDownloader;

/// Handle to a download running on the tokio runtime
///
/// The task owns its connection and its [`ResponseBuffer`]. Awaiting
/// [`join`](Self::join) suspends until the download finishes and hands back
/// the filled buffer, or re-raises the error that ended it.
/// [`finish`](Self::finish) returns the buffer in both cases, so the bytes
/// that arrived before a failure stay inspectable. Dropping the handle
/// detaches the task; it keeps running to completion.
#[derive(Debug)]
pub struct DownloadTask {
    name: String,
    cancel_token: CancellationToken,
    handle: JoinHandle<(ResponseBuffer, Result<ResponseHead>)>,
}

impl DownloadTask {
    /// Task name, `download <host><path>`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the download to stop at its current suspension point
    ///
    /// [`join`](Self::join) then returns [`Error::Cancelled`]. Has no effect
    /// once the download has finished.
    pub fn cancel(&self) {
        self.cancel_token.cancel();
    }

    /// True once the download has completed, failed or been cancelled
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the download and return its result
    pub async fn join(self) -> Result<CompletedDownload> {
        let (buffer, result) = self.finish().await;
        result.map(|head| CompletedDownload { head, buffer })
    }

    /// Wait for the download and return the buffer alongside the outcome
    ///
    /// On failure the buffer holds whatever arrived before the error. If the
    /// task itself panicked or was aborted the buffer is lost and an empty
    /// one is returned with [`Error::Task`] or [`Error::Cancelled`].
    pub async fn finish(self) -> (ResponseBuffer, Result<ResponseHead>) {
        match self.handle.await {
            Ok(outcome) => outcome,
            Err(e) if e.is_cancelled() => (ResponseBuffer::new(), Err(Error::Cancelled)),
            Err(e) => (ResponseBuffer::new(), Err(Error::Task(e.to_string()))),
        }
    }
}

impl<T: Transport> HttpDownloader<T> {
    /// Start downloading `path` from `host` as a spawned task
    ///
    /// Must be called from within a tokio runtime. Each task gets its own
    /// buffer and connection, so concurrent tasks never share state.
    /// See [`spawn_download_into`](Self::spawn_download_into) to supply the
    /// buffer.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use async_http_get::{Config, HttpDownloader};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let downloader = HttpDownloader::new(Config::default())?;
    ///
    ///     let task = downloader.spawn_download("example.com", "/");
    ///     let download = task.join().await?;
    ///     println!("{} body bytes", download.body().len());
    ///
    ///     Ok(())
    /// }
    /// ```
    pub fn spawn_download(&self, host: impl Into<String>, path: impl Into<String>) -> DownloadTask {
        self.spawn_download_into(host, path, ResponseBuffer::new())
    }

    /// Start a spawned download that appends to a caller-supplied buffer
    ///
    /// The buffer moves into the task and comes back from
    /// [`DownloadTask::join`] or [`DownloadTask::finish`].
    pub fn spawn_download_into(
        &self,
        host: impl Into<String>,
        path: impl Into<String>,
        mut buffer: ResponseBuffer,
    ) -> DownloadTask {
        let host = host.into();
        let path = path.into();
        let name = format!("download {host}{path}");
        let cancel_token = CancellationToken::new();

        let downloader = self.clone();
        let token = cancel_token.clone();
        let task_name = name.clone();

        let handle = tokio::spawn(async move {
            let result = tokio::select! {
                _ = token.cancelled() => Err(Error::Cancelled),
                result = downloader.download(&host, &path, &mut buffer) => result,
            };

            if matches!(result, Err(Error::Cancelled)) {
                tracing::info!(task = %task_name, "Download cancelled");
                downloader.emit_event(Event::Failed {
                    host,
                    path,
                    code: Error::Cancelled.error_code().to_string(),
                    error: Error::Cancelled.to_string(),
                });
            }

            (buffer, result)
        });

        DownloadTask {
            name,
            cancel_token,
            handle,
        }
    }
}

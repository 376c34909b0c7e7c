//! Retry with exponential backoff, layered above single downloads
//!
//! A download never retries internally (apart from trying the next resolved
//! endpoint). Callers that want to ride out transient failures wrap the
//! whole download in [`download_with_retry`], which starts each attempt from
//! scratch.
//!
//! # Example
//!
//! ```no_run
//! use async_http_get::config::RetryConfig;
//! use async_http_get::retry::download_with_retry;
//! use async_http_get::{Config, Error, HttpDownloader, ResponseBuffer};
//!
//! # async fn example() -> Result<(), Error> {
//! let downloader = HttpDownloader::new(Config::default())?;
//! let body = download_with_retry(&RetryConfig::default(), || async {
//!     let mut buffer = ResponseBuffer::new();
//!     downloader.download("example.com", "/", &mut buffer).await?;
//!     Ok::<_, Error>(buffer.body().to_vec())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

use crate::config::RetryConfig;
use crate::error::Error;
use rand::Rng;
use std::future::Future;
use std::time::Duration;

/// Classifies errors as transient (worth another attempt) or permanent
pub trait IsRetryable {
    /// Returns true if the operation should be attempted again
    fn is_retryable(&self) -> bool;
}

impl IsRetryable for Error {
    fn is_retryable(&self) -> bool {
        match self {
            // Lookups that merely stalled may succeed next time
            Error::Resolve { source, .. } => is_transient_io(source),
            Error::Connect { .. } => true,
            Error::Transfer { .. } => true,
            Error::Timeout { .. } => true,
            Error::Io(e) => is_transient_io(e),
            // Server-side trouble; client errors will not change on retry
            Error::BadStatus { code, .. } => *code >= 500,
            Error::InvalidResponse(_)
            | Error::MissingContentLength
            | Error::BodyTooLarge { .. }
            | Error::Cancelled
            | Error::InvalidUrl(_)
            | Error::Config { .. }
            | Error::Task(_) => false,
        }
    }
}

fn is_transient_io(e: &std::io::Error) -> bool {
    matches!(
        e.kind(),
        std::io::ErrorKind::TimedOut
            | std::io::ErrorKind::ConnectionRefused
            | std::io::ErrorKind::ConnectionReset
            | std::io::ErrorKind::ConnectionAborted
            | std::io::ErrorKind::NotConnected
            | std::io::ErrorKind::BrokenPipe
            | std::io::ErrorKind::Interrupted
    )
}

/// Run `operation`, retrying retryable failures with exponential backoff
///
/// Makes at most `config.max_attempts + 1` calls. Returns the first success,
/// the first non-retryable error, or the last error once attempts run out.
pub async fn download_with_retry<F, Fut, T, E>(
    config: &RetryConfig,
    mut operation: F,
) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: IsRetryable + std::fmt::Display,
{
    let mut backoff = Backoff::new(config);
    let mut retries = 0;

    loop {
        let error = match operation().await {
            Ok(result) => {
                if retries > 0 {
                    tracing::info!(retries, "Download succeeded on retry");
                }
                return Ok(result);
            }
            Err(e) => e,
        };

        if !error.is_retryable() {
            tracing::error!(error = %error, "Download failed, not retrying");
            return Err(error);
        }
        if retries >= config.max_attempts {
            tracing::error!(error = %error, retries, "Download failed, retries exhausted");
            return Err(error);
        }

        retries += 1;
        let wait = backoff.next_wait();
        tracing::warn!(
            error = %error,
            retry = retries,
            max_retries = config.max_attempts,
            wait_ms = wait.as_millis(),
            "Download failed, retrying"
        );
        tokio::time::sleep(wait).await;
    }
}

/// Delay schedule: grows by `backoff_multiplier` per retry, capped at
/// `max_delay`
struct Backoff {
    delay: Duration,
    max_delay: Duration,
    multiplier: f64,
    jitter: bool,
}

impl Backoff {
    fn new(config: &RetryConfig) -> Self {
        Self {
            delay: config.initial_delay.min(config.max_delay),
            max_delay: config.max_delay,
            multiplier: config.backoff_multiplier,
            jitter: config.jitter,
        }
    }

    /// Wait before the next retry, advancing the schedule
    fn next_wait(&mut self) -> Duration {
        let wait = if self.jitter {
            add_jitter(self.delay)
        } else {
            self.delay
        };
        self.delay = scale(self.delay, self.multiplier).min(self.max_delay);
        wait
    }
}

/// Multiply `delay` by `factor`, saturating instead of overflowing
///
/// A product that is not representable (too large, negative or NaN)
/// becomes `Duration::MAX`.
fn scale(delay: Duration, factor: f64) -> Duration {
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}

/// Stretch `delay` by a random factor in `[1.0, 2.0]`
fn add_jitter(delay: Duration) -> Duration {
    let factor: f64 = rand::thread_rng().gen_range(1.0..=2.0);
    scale(delay, factor)
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Stage;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_config(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            initial_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(50),
            backoff_multiplier: 2.0,
            jitter: false,
        }
    }

    fn refused() -> Error {
        Error::Connect {
            host: "example.com".into(),
            attempts: 2,
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        }
    }

    #[tokio::test]
    async fn success_on_first_try_calls_once() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = download_with_retry(&fast_config(3), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok::<_, Error>(42)
            }
        })
        .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn connect_failures_are_retried_until_success() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = download_with_retry(&fast_config(3), || {
            let calls = calls.clone();
            async move {
                if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                    Err(refused())
                } else {
                    Ok(7)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_attempts() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = download_with_retry(&fast_config(2), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::Transfer {
                    stage: Stage::Body,
                    expected: Some(17),
                    received: 10,
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Transfer { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 3, "initial try plus 2 retries");
    }

    #[tokio::test]
    async fn not_found_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));

        let result = download_with_retry(&fast_config(5), || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(Error::BadStatus {
                    code: 404,
                    message: "Not Found".into(),
                })
            }
        })
        .await;

        assert!(matches!(result, Err(Error::BadStatus { code: 404, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn classification_follows_error_kind() {
        assert!(refused().is_retryable());
        assert!(
            Error::BadStatus {
                code: 503,
                message: "Service Unavailable".into()
            }
            .is_retryable()
        );
        assert!(
            Error::Timeout {
                stage: Stage::Headers,
                after: Duration::from_secs(1)
            }
            .is_retryable()
        );
        assert!(!Error::InvalidResponse("bad version".into()).is_retryable());
        assert!(!Error::Cancelled.is_retryable());
        assert!(
            !Error::Resolve {
                host: "nope.invalid".into(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such host"),
            }
            .is_retryable()
        );
        assert!(
            Error::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "reset"
            ))
            .is_retryable()
        );
    }

    #[test]
    fn jitter_stays_within_double_delay() {
        let delay = Duration::from_millis(100);
        for _ in 0..20 {
            let jittered = add_jitter(delay);
            assert!(jittered >= delay);
            assert!(jittered <= delay * 2);
        }
    }

    #[tokio::test]
    async fn oversized_multiplier_caps_at_max_delay() {
        let config = RetryConfig {
            backoff_multiplier: 1e300,
            ..fast_config(3)
        };
        let calls = Arc::new(AtomicU32::new(0));

        let result = download_with_retry(&config, || {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(refused())
            }
        })
        .await;

        assert!(matches!(result, Err(Error::Connect { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn backoff_grows_then_saturates() {
        let mut backoff = Backoff::new(&fast_config(3));
        assert_eq!(backoff.next_wait(), Duration::from_millis(5));
        assert_eq!(backoff.next_wait(), Duration::from_millis(10));
        assert_eq!(backoff.next_wait(), Duration::from_millis(20));
        assert_eq!(backoff.next_wait(), Duration::from_millis(40));
        assert_eq!(backoff.next_wait(), Duration::from_millis(50));
        assert_eq!(backoff.next_wait(), Duration::from_millis(50));

        let mut unbounded = Backoff::new(&RetryConfig {
            backoff_multiplier: f64::NAN,
            max_delay: Duration::from_secs(u64::MAX),
            ..fast_config(3)
        });
        unbounded.next_wait();
        assert_eq!(unbounded.next_wait(), Duration::from_secs(u64::MAX));
    }

    #[test]
    fn scale_saturates_on_overflow() {
        assert_eq!(scale(Duration::from_secs(1), 1e300), Duration::MAX);
        assert_eq!(scale(Duration::from_secs(1), f64::NAN), Duration::MAX);
        assert_eq!(scale(Duration::from_millis(10), 4.0), Duration::from_millis(40));
    }
}

//! Suspending read/write helpers over any `AsyncRead + AsyncWrite` stream.
//!
//! All reads append into a [`ResponseBuffer`] as data arrives, so bytes that
//! made it across before a failure stay visible to the caller. Every single
//! read or write is bounded by the configured I/O timeout.

use crate::buffer::ResponseBuffer;
use crate::error::{Error, Result, Stage};
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// Size of each read from the stream
const CHUNK_SIZE: usize = 8 * 1024;

/// Run `fut`, failing with [`Error::Timeout`] if it takes longer than `after`
pub(crate) async fn with_timeout<T, F>(stage: Stage, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(after, fut)
        .await
        .map_err(|_| Error::Timeout { stage, after })?
}

/// Write all of `bytes` and flush
pub(crate) async fn write_all<S>(
    stream: &mut S,
    bytes: &[u8],
    io_timeout: Duration,
) -> Result<usize>
where
    S: AsyncWrite + Unpin,
{
    with_timeout(Stage::Write, io_timeout, async {
        stream.write_all(bytes).await?;
        stream.flush().await?;
        Ok::<_, Error>(bytes.len())
    })
    .await
}

/// Read until `delimiter` appears at or after `from`
///
/// Returns the offset one past the delimiter. Reads are not delimiter-exact:
/// bytes following the delimiter that arrived in the same read stay in the
/// buffer.
pub(crate) async fn read_until<S>(
    stream: &mut S,
    buffer: &mut ResponseBuffer,
    from: usize,
    delimiter: &[u8],
    stage: Stage,
    io_timeout: Duration,
) -> Result<usize>
where
    S: AsyncRead + Unpin,
{
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut scan_from = from;

    loop {
        if let Some(end) = buffer.find(scan_from, delimiter) {
            return Ok(end);
        }
        // A delimiter may straddle the boundary of the next read
        scan_from = buffer
            .len()
            .saturating_sub(delimiter.len() - 1)
            .max(from);

        let n = read_chunk(stream, &mut chunk, stage, io_timeout).await?;
        if n == 0 {
            return Err(Error::Transfer {
                stage,
                expected: None,
                received: buffer.len().saturating_sub(from) as u64,
            });
        }
        buffer.extend(&chunk[..n]);
    }
}

/// Read exactly `count` more bytes into the buffer
pub(crate) async fn read_exact<S>(
    stream: &mut S,
    buffer: &mut ResponseBuffer,
    count: u64,
    stage: Stage,
    io_timeout: Duration,
) -> Result<u64>
where
    S: AsyncRead + Unpin,
{
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut received = 0u64;

    while received < count {
        let want = (count - received).min(CHUNK_SIZE as u64) as usize;
        let n = read_chunk(stream, &mut chunk[..want], stage, io_timeout).await?;
        if n == 0 {
            return Err(Error::Transfer {
                stage,
                expected: Some(count),
                received,
            });
        }
        buffer.extend(&chunk[..n]);
        received += n as u64;
    }

    Ok(received)
}

/// Read until the peer closes the connection
///
/// Fails with [`Error::BodyTooLarge`] once more than `limit` bytes arrive.
pub(crate) async fn read_to_end<S>(
    stream: &mut S,
    buffer: &mut ResponseBuffer,
    already: u64,
    limit: Option<u64>,
    stage: Stage,
    io_timeout: Duration,
) -> Result<u64>
where
    S: AsyncRead + Unpin,
{
    let mut chunk = [0u8; CHUNK_SIZE];
    let mut total = already;

    loop {
        if let Some(limit) = limit {
            if total > limit {
                return Err(Error::BodyTooLarge { limit });
            }
        }
        let n = read_chunk(stream, &mut chunk, stage, io_timeout).await?;
        if n == 0 {
            return Ok(total - already);
        }
        buffer.extend(&chunk[..n]);
        total += n as u64;
    }
}

async fn read_chunk<S>(
    stream: &mut S,
    chunk: &mut [u8],
    stage: Stage,
    io_timeout: Duration,
) -> Result<usize>
where
    S: AsyncRead + Unpin,
{
    with_timeout(stage, io_timeout, async {
        Ok::<_, Error>(stream.read(chunk).await?)
    })
    .await
}

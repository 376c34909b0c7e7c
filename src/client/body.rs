//! Body read after the handshake.

use tokio::io::AsyncRead;

use crate::buffer::ResponseBuffer;
use crate::config::{Config, MissingLengthPolicy};
use crate::error::{Error, Result, Stage};
use crate::io;
use crate::types::ResponseHead;

/// Pull the rest of the body into `buffer`, returning the total body length
///
/// Body bytes already read ahead by the header read count toward the
/// content length, so only `content_length - buffer.body().len()` more bytes
/// are requested from the stream.
pub(super) async fn read_body<S>(
    stream: &mut S,
    head: &ResponseHead,
    buffer: &mut ResponseBuffer,
    config: &Config,
) -> Result<u64>
where
    S: AsyncRead + Unpin,
{
    let buffered = buffer.body().len() as u64;

    match head.content_length {
        Some(length) => {
            let remaining = length.checked_sub(buffered).ok_or_else(|| {
                Error::InvalidResponse(format!(
                    "received {buffered} body bytes but Content-Length is {length}"
                ))
            })?;
            io::read_exact(stream, buffer, remaining, Stage::Body, config.io_timeout)
                .await
                .map_err(|e| match e {
                    // Report against the whole body, not just the remainder
                    Error::Transfer {
                        stage, received, ..
                    } => Error::Transfer {
                        stage,
                        expected: Some(length),
                        received: buffered + received,
                    },
                    other => other,
                })?;
            Ok(length)
        }
        None => match config.missing_length {
            MissingLengthPolicy::Fail => Err(Error::MissingContentLength),
            MissingLengthPolicy::ReadToEnd => {
                let read = io::read_to_end(
                    stream,
                    buffer,
                    buffered,
                    config.max_body_bytes,
                    Stage::Body,
                    config.io_timeout,
                )
                .await?;
                Ok(buffered + read)
            }
        },
    }
}

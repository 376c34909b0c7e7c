//! Request/response handshake up through header parsing.

use std::net::SocketAddr;

use crate::buffer::ResponseBuffer;
use crate::error::{Error, Result, Stage};
use crate::io;
use crate::protocol::{self, HEADER_END, LINE_END};
use crate::transport::Transport;
use crate::types::{Event, ResponseHead};

use super::HttpDownloader;

impl<T: Transport> HttpDownloader<T> {
    /// Run the handshake for `path` on `host` against a fresh connection
    ///
    /// Steps, each one a suspension point:
    /// 1. Resolve `host` on the configured port
    /// 2. Connect to the candidates in resolution order until one accepts
    /// 3. Send the GET request
    /// 4. Read and validate the status line (must be `HTTP/...` with status 200)
    /// 5. Read the header block and extract `Content-Length`
    ///
    /// Returns the open connection and the parsed head. `buffer` is left
    /// holding the status line, the header block and any body bytes that
    /// were read ahead; its header boundary is marked so that
    /// [`ResponseBuffer::body`] yields those read-ahead bytes.
    pub async fn perform_handshake(
        &self,
        host: &str,
        path: &str,
        buffer: &mut ResponseBuffer,
    ) -> Result<(T::Stream, ResponseHead)> {
        self.handshake_on(host, self.config.port, path, buffer).await
    }

    pub(crate) async fn handshake_on(
        &self,
        host: &str,
        port: u16,
        path: &str,
        buffer: &mut ResponseBuffer,
    ) -> Result<(T::Stream, ResponseHead)> {
        let io_timeout = self.config.io_timeout;

        let candidates = self.resolve(host, port).await?;
        let mut stream = self.connect_with_failover(host, &candidates).await?;

        let request = protocol::build_request(host, path);
        io::write_all(&mut stream, &request, io_timeout).await?;

        let start = buffer.len();
        let line_end = io::read_until(
            &mut stream,
            buffer,
            start,
            LINE_END,
            Stage::StatusLine,
            io_timeout,
        )
        .await?;
        let status = protocol::parse_status_line(&buffer.as_bytes()[start..line_end])?;
        protocol::check_status(&status)?;

        // The status line's CRLF doubles as the first half of the blank line
        // when the response carries no headers at all
        let header_end = io::read_until(
            &mut stream,
            buffer,
            line_end - LINE_END.len(),
            HEADER_END,
            Stage::Headers,
            io_timeout,
        )
        .await?;
        let content_length =
            protocol::parse_content_length(&buffer.as_bytes()[line_end..header_end])?;
        buffer.mark_header_end(header_end);

        tracing::debug!(
            host,
            status = status.code,
            content_length = ?content_length,
            read_ahead = buffer.body().len(),
            "Response headers parsed"
        );
        self.emit_event(Event::HeadersReceived {
            status: status.code,
            content_length,
        });

        let head = ResponseHead {
            version: status.version,
            status: status.code,
            message: status.message,
            content_length,
        };
        Ok((stream, head))
    }

    async fn resolve(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>> {
        let after = self.config.io_timeout;
        let candidates = match tokio::time::timeout(after, self.transport.resolve(host, port)).await
        {
            Ok(Ok(candidates)) => candidates,
            Ok(Err(source)) => {
                return Err(Error::Resolve {
                    host: host.to_string(),
                    source,
                });
            }
            Err(_) => {
                return Err(Error::Timeout {
                    stage: Stage::Resolve,
                    after,
                });
            }
        };

        if candidates.is_empty() {
            return Err(Error::Resolve {
                host: host.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses found"),
            });
        }

        tracing::debug!(host, port, candidates = candidates.len(), "Resolved host");
        self.emit_event(Event::Resolved {
            host: host.to_string(),
            candidates: candidates.len(),
        });
        Ok(candidates)
    }

    /// Try each candidate in order; the first successful connect wins
    async fn connect_with_failover(
        &self,
        host: &str,
        candidates: &[SocketAddr],
    ) -> Result<T::Stream> {
        let mut last_error = None;

        for (index, &addr) in candidates.iter().enumerate() {
            match self.connect_once(addr).await {
                Ok(stream) => {
                    tracing::debug!(host, %addr, attempt = index + 1, "Connected");
                    self.emit_event(Event::Connected { addr });
                    return Ok(stream);
                }
                Err(e) => {
                    tracing::debug!(
                        host,
                        %addr,
                        attempt = index + 1,
                        error = %e,
                        "Connect attempt failed, trying next endpoint"
                    );
                    self.emit_event(Event::ConnectFailed {
                        addr,
                        error: e.to_string(),
                    });
                    last_error = Some(e);
                }
            }
        }

        Err(Error::Connect {
            host: host.to_string(),
            attempts: candidates.len(),
            source: last_error.unwrap_or_else(|| {
                std::io::Error::new(std::io::ErrorKind::NotFound, "no endpoints to try")
            }),
        })
    }

    async fn connect_once(&self, addr: SocketAddr) -> std::io::Result<T::Stream> {
        let after = self.config.connect_timeout;
        match tokio::time::timeout(after, self.transport.connect(addr)).await {
            Ok(result) => result,
            Err(_) => Err(std::io::Error::new(
                std::io::ErrorKind::TimedOut,
                format!("connect timed out after {after:?}"),
            )),
        }
    }
}

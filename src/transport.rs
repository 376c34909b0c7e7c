//! Name resolution and connection establishment.
//!
//! [`Transport`] is the seam between the download logic and the network.
//! [`TokioTransport`] is the production implementation on top of the tokio
//! reactor; tests plug in scripted transports to control which endpoints
//! resolve and which of them accept connections.

use std::net::SocketAddr;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::TcpStream;

/// Resolves hostnames and opens connections to resolved endpoints
#[async_trait::async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Connection handle produced by [`connect`](Self::connect)
    type Stream: AsyncRead + AsyncWrite + Unpin + Send + 'static;

    /// Look up `host`, returning candidate endpoints in preference order
    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<SocketAddr>>;

    /// Open a connection to a single endpoint
    async fn connect(&self, addr: SocketAddr) -> std::io::Result<Self::Stream>;
}

/// [`Transport`] backed by the system resolver and TCP sockets
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioTransport;

#[async_trait::async_trait]
impl Transport for TokioTransport {
    type Stream = TcpStream;

    async fn resolve(&self, host: &str, port: u16) -> std::io::Result<Vec<SocketAddr>> {
        let addrs = tokio::net::lookup_host((host, port)).await?;
        Ok(addrs.collect())
    }

    async fn connect(&self, addr: SocketAddr) -> std::io::Result<TcpStream> {
        TcpStream::connect(addr).await
    }
}

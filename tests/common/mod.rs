//! Common test utilities for async-http-get integration tests

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use async_http_get::{TokioTransport, Transport};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One-shot HTTP/1.0 server on localhost
///
/// Accepts a single connection, captures the request head, writes the
/// scripted response chunks with a short pause between them, then closes.
pub struct OneShotServer {
    pub addr: SocketAddr,
    handle: JoinHandle<Vec<u8>>,
}

impl OneShotServer {
    pub async fn start(chunks: &[&'static str]) -> Self {
        let chunks = chunks.to_vec();
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let request = read_request(&mut socket).await;
            for chunk in chunks {
                if socket.write_all(chunk.as_bytes()).await.is_err() {
                    break;
                }
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            request
        });

        Self { addr, handle }
    }

    /// Request bytes the client sent
    pub async fn request(self) -> Vec<u8> {
        self.handle.await.unwrap()
    }
}

async fn read_request(socket: &mut TcpStream) -> Vec<u8> {
    let mut request = Vec::new();
    let mut chunk = [0u8; 1024];
    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        request.extend_from_slice(&chunk[..n]);
    }
    request
}

/// Address nothing is listening on
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Resolves every host to a fixed candidate list, connects over real TCP
pub struct FixedTransport {
    pub candidates: Vec<SocketAddr>,
}

#[async_trait::async_trait]
impl Transport for FixedTransport {
    type Stream = TcpStream;

    async fn resolve(&self, _host: &str, _port: u16) -> std::io::Result<Vec<SocketAddr>> {
        Ok(self.candidates.clone())
    }

    async fn connect(&self, addr: SocketAddr) -> std::io::Result<TcpStream> {
        TokioTransport.connect(addr).await
    }
}

//! End-to-end downloads against a local TCP server
//!
//! These tests exercise the real tokio transport: name resolution of an IP
//! literal, TCP connects (including refused ones), and reads whose chunking
//! is decided by the kernel rather than a mock.

mod common;

use async_http_get::protocol::build_request;
use async_http_get::{Config, Error, Event, HttpDownloader, ResponseBuffer, Stage};
use common::{FixedTransport, OneShotServer, closed_addr};

fn config_for_port(port: u16) -> Config {
    Config {
        port,
        ..Config::default()
    }
}

#[tokio::test]
async fn downloads_body_split_across_writes() {
    let server = OneShotServer::start(&[
        "HTTP/1.0 200 OK\r\n",
        "Content-Type: text/plain\r\nContent-Length: 17\r\n\r\n",
        "01234567",
        "89abcdefg",
    ])
    .await;
    let downloader = HttpDownloader::new(config_for_port(server.addr.port())).unwrap();
    let mut buffer = ResponseBuffer::new();

    let head = downloader
        .download("127.0.0.1", "/hello.txt", &mut buffer)
        .await
        .unwrap();

    assert_eq!(head.status, 200);
    assert_eq!(head.content_length, Some(17));
    assert_eq!(buffer.body(), b"0123456789abcdefg");
    assert!(buffer.headers().starts_with(b"HTTP/1.0 200 OK\r\n"));
    assert_eq!(
        server.request().await,
        build_request("127.0.0.1", "/hello.txt")
    );
}

#[tokio::test]
async fn fails_over_from_refused_endpoint() {
    let server = OneShotServer::start(&["HTTP/1.0 200 OK\r\nContent-Length: 2\r\n\r\nok"]).await;
    let dead = closed_addr().await;
    let transport = FixedTransport {
        candidates: vec![dead, server.addr],
    };
    let downloader = HttpDownloader::with_transport(Config::default(), transport).unwrap();
    let mut events = downloader.subscribe();
    let mut buffer = ResponseBuffer::new();

    downloader
        .download("example.test", "/", &mut buffer)
        .await
        .unwrap();

    assert_eq!(buffer.body(), b"ok");
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert!(matches!(seen[1], Event::ConnectFailed { addr, .. } if addr == dead));
    assert!(matches!(seen[2], Event::Connected { addr } if addr == server.addr));
}

#[tokio::test]
async fn all_endpoints_refused() {
    let transport = FixedTransport {
        candidates: vec![closed_addr().await, closed_addr().await],
    };
    let downloader = HttpDownloader::with_transport(Config::default(), transport).unwrap();
    let mut buffer = ResponseBuffer::new();

    let err = downloader
        .download("example.test", "/", &mut buffer)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Connect { attempts: 2, .. }));
}

#[tokio::test]
async fn short_body_is_transfer_error() {
    let server = OneShotServer::start(&[
        "HTTP/1.0 200 OK\r\nContent-Length: 17\r\n\r\n",
        "0123456789",
    ])
    .await;
    let downloader = HttpDownloader::new(config_for_port(server.addr.port())).unwrap();
    let mut buffer = ResponseBuffer::new();

    let err = downloader
        .download("127.0.0.1", "/short", &mut buffer)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        Error::Transfer {
            stage: Stage::Body,
            expected: Some(17),
            received: 10
        }
    ));
    assert_eq!(buffer.body(), b"0123456789");
}

#[tokio::test]
async fn server_error_status_is_reported() {
    let server = OneShotServer::start(&["HTTP/1.0 500 Internal Server Error\r\n\r\n"]).await;
    let downloader = HttpDownloader::new(config_for_port(server.addr.port())).unwrap();
    let mut buffer = ResponseBuffer::new();

    let err = downloader
        .download("127.0.0.1", "/", &mut buffer)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::BadStatus { code: 500, .. }));
}

#[tokio::test]
async fn body_without_length_runs_to_close() {
    let server = OneShotServer::start(&[
        "HTTP/1.0 200 OK\r\nServer: test\r\n\r\n",
        "streamed ",
        "until close",
    ])
    .await;
    let downloader = HttpDownloader::new(config_for_port(server.addr.port())).unwrap();
    let mut buffer = ResponseBuffer::new();

    let head = downloader
        .download("127.0.0.1", "/stream", &mut buffer)
        .await
        .unwrap();

    assert_eq!(head.content_length, None);
    assert_eq!(buffer.body(), b"streamed until close");
}

#[tokio::test]
async fn url_download_uses_url_port() {
    let server = OneShotServer::start(&["HTTP/1.0 200 OK\r\nContent-Length: 3\r\n\r\nurl"]).await;
    let downloader = HttpDownloader::new(Config::default()).unwrap();
    let mut buffer = ResponseBuffer::new();

    let url = format!("http://127.0.0.1:{}/a/b?c=d", server.addr.port());
    downloader.download_url(&url, &mut buffer).await.unwrap();

    assert_eq!(buffer.body(), b"url");
    assert_eq!(server.request().await, build_request("127.0.0.1", "/a/b?c=d"));
}

#[tokio::test]
async fn independent_tasks_do_not_share_buffers() {
    let first = OneShotServer::start(&["HTTP/1.0 200 OK\r\nContent-Length: 5\r\n\r\nalpha"]).await;
    let second = OneShotServer::start(&["HTTP/1.0 200 OK\r\nContent-Length: 4\r\n\r\nbeta"]).await;

    let a = HttpDownloader::new(config_for_port(first.addr.port())).unwrap();
    let b = HttpDownloader::new(config_for_port(second.addr.port())).unwrap();

    let task_a = a.spawn_download("127.0.0.1", "/same");
    let task_b = b.spawn_download("127.0.0.1", "/same");

    let (ra, rb) = tokio::join!(task_a.join(), task_b.join());
    assert_eq!(ra.unwrap().body(), b"alpha");
    assert_eq!(rb.unwrap().body(), b"beta");
}

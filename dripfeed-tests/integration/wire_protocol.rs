//! Raw-socket assertions for wire-level details
//!
//! Reason phrases and transfer framing are invisible through high-level
//! clients, so these tests speak HTTP/1.1 over a plain TCP stream and
//! assert on the literal bytes.

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use crate::harness::TestServer;

async fn raw_get(server: &TestServer, path: &str) -> String {
    let mut stream = TcpStream::connect(server.addr).await.expect("connect");
    let request = format!(
        "GET {path} HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n",
        server.addr
    );
    stream.write_all(request.as_bytes()).await.expect("send request");

    let mut response = Vec::new();
    stream.read_to_end(&mut response).await.expect("read response");
    String::from_utf8_lossy(&response).into_owned()
}

#[tokio::test]
async fn test_fail_reason_phrase_is_uppercase() {
    let server = TestServer::start().await;

    let response = raw_get(&server, "/fail").await;
    assert!(
        response.starts_with("HTTP/1.1 403 FORBIDDEN\r\n"),
        "unexpected status line: {}",
        response.lines().next().unwrap_or("")
    );
}

#[tokio::test]
async fn test_status_400_reason_phrase() {
    let server = TestServer::start().await;

    let response = raw_get(&server, "/status/400").await;
    assert!(
        response.starts_with("HTTP/1.1 400 BAD REQUEST\r\n"),
        "unexpected status line: {}",
        response.lines().next().unwrap_or("")
    );
}

#[tokio::test]
async fn test_status_403_reason_phrase() {
    let server = TestServer::start().await;

    let response = raw_get(&server, "/status/403").await;
    assert!(response.starts_with("HTTP/1.1 403 FORBIDDEN\r\n"));
}

#[tokio::test]
async fn test_other_statuses_keep_canonical_phrases() {
    let server = TestServer::start().await;

    let response = raw_get(&server, "/status/404").await;
    assert!(
        response.starts_with("HTTP/1.1 404 Not Found\r\n"),
        "unexpected status line: {}",
        response.lines().next().unwrap_or("")
    );
}

#[tokio::test]
async fn test_index_is_chunked_without_content_length() {
    let server = TestServer::start().await;

    let response = raw_get(&server, "/").await;
    let lowered = response.to_ascii_lowercase();
    let headers_end = lowered.find("\r\n\r\n").expect("header terminator");

    assert!(lowered[..headers_end].contains("transfer-encoding: chunked"));
    assert!(!lowered[..headers_end].contains("content-length"));
    assert!(response.contains("Local Test Server Running"));
}

//! Integration tests for range-aware paced file delivery

use std::time::{Duration, Instant};

use rand::RngCore;
use reqwest::StatusCode;
use reqwest::header::{
    ACCEPT_RANGES, CONTENT_DISPOSITION, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, ETAG,
    LAST_MODIFIED, RANGE,
};

use crate::harness::{TestServer, patterned_bytes};

#[tokio::test]
async fn test_full_download_round_trip() {
    let server = TestServer::start().await;
    let mut payload = vec![0u8; 200_000];
    rand::rng().fill_bytes(&mut payload);
    server.write_file("data.bin", &payload);

    let response = reqwest::get(server.url("/files/data.bin")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(ACCEPT_RANGES).unwrap(), "bytes");
    assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "200000");
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/octet-stream"
    );
    assert_eq!(
        response.headers().get(CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=data.bin"
    );
    assert!(response.headers().get(ETAG).is_some());
    assert!(response.headers().get(LAST_MODIFIED).is_some());
    assert!(response.headers().get(CONTENT_RANGE).is_none());

    let bytes = response.bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_zip_suffix_sets_content_type() {
    let server = TestServer::start().await;
    server.write_file("archive.ZIP", b"PK\x03\x04fake");

    let response = reqwest::get(server.url("/files/archive.ZIP")).await.unwrap();
    assert_eq!(
        response.headers().get(CONTENT_TYPE).unwrap(),
        "application/zip"
    );
}

#[tokio::test]
async fn test_explicit_range_returns_exact_span() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(10_000);
    server.write_file("data.bin", &payload);

    let response = reqwest::Client::new()
        .get(server.url("/files/data.bin"))
        .header(RANGE, "bytes=100-199")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(CONTENT_RANGE).unwrap(),
        "bytes 100-199/10000"
    );
    assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "100");
    let bytes = response.bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), &payload[100..200]);
}

#[tokio::test]
async fn test_open_ended_range() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(10_000);
    server.write_file("data.bin", &payload);

    let response = reqwest::Client::new()
        .get(server.url("/files/data.bin"))
        .header(RANGE, "bytes=9000-")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(CONTENT_RANGE).unwrap(),
        "bytes 9000-9999/10000"
    );
    let bytes = response.bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), &payload[9000..]);
}

#[tokio::test]
async fn test_suffix_range_returns_last_bytes() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(10_000);
    server.write_file("data.bin", &payload);

    let response = reqwest::Client::new()
        .get(server.url("/files/data.bin"))
        .header(RANGE, "bytes=-500")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(CONTENT_RANGE).unwrap(),
        "bytes 9500-9999/10000"
    );
    let bytes = response.bytes().await.unwrap();
    assert_eq!(bytes.as_ref(), &payload[9500..]);
}

#[tokio::test]
async fn test_range_end_is_clamped_to_file() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(10_000);
    server.write_file("data.bin", &payload);

    let response = reqwest::Client::new()
        .get(server.url("/files/data.bin"))
        .header(RANGE, "bytes=9900-999999")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
    assert_eq!(
        response.headers().get(CONTENT_RANGE).unwrap(),
        "bytes 9900-9999/10000"
    );
    assert_eq!(response.bytes().await.unwrap().len(), 100);
}

#[tokio::test]
async fn test_unsatisfiable_range_is_416() {
    let server = TestServer::start().await;
    server.write_file("data.bin", &patterned_bytes(1000));

    for range in ["bytes=1000-", "bytes=500-400", "bytes=-0"] {
        let response = reqwest::Client::new()
            .get(server.url("/files/data.bin"))
            .header(RANGE, range)
            .send()
            .await
            .unwrap();
        assert_eq!(
            response.status(),
            StatusCode::RANGE_NOT_SATISFIABLE,
            "range {range} should be unsatisfiable"
        );
        assert_eq!(
            response.text().await.unwrap(),
            "Requested Range Not Satisfiable"
        );
    }
}

#[tokio::test]
async fn test_malformed_range_falls_back_to_full_file() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(5000);
    server.write_file("data.bin", &payload);

    for range in ["bytes=abc-def", "bytes=0-5,10-15", "chars=0-10"] {
        let response = reqwest::Client::new()
            .get(server.url("/files/data.bin"))
            .header(RANGE, range)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "range {range}");
        assert_eq!(response.bytes().await.unwrap().as_ref(), payload.as_slice());
    }
}

#[tokio::test]
async fn test_no_content_length_still_delivers_full_body() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(80_000);
    server.write_file("data.bin", &payload);

    let response = reqwest::get(server.url("/files/data.bin?no_content_length=true"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CONTENT_LENGTH).is_none());
    assert_eq!(response.bytes().await.unwrap().as_ref(), payload.as_slice());
}

#[tokio::test]
async fn test_missing_file_is_404() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/files/absent.bin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "File not found");
}

#[tokio::test]
async fn test_delay_table_paces_download() {
    let server = TestServer::start_with(|config| {
        config
            .files
            .delays
            .insert("slow.bin".to_string(), Duration::from_millis(400));
    })
    .await;
    // Five 64 KiB chunks → 80 ms between chunks.
    let payload = patterned_bytes(320 * 1024);
    server.write_file("slow.bin", &payload);

    let started = Instant::now();
    let response = reqwest::get(server.url("/files/slow.bin")).await.unwrap();
    let bytes = response.bytes().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(bytes.as_ref(), payload.as_slice());
    assert!(
        elapsed >= Duration::from_millis(300),
        "paced download finished too quickly: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_unlisted_file_returns_immediately() {
    let server = TestServer::start_with(|config| {
        config
            .files
            .delays
            .insert("slow.bin".to_string(), Duration::from_secs(10));
    })
    .await;
    server.write_file("fast.bin", &patterned_bytes(256 * 1024));

    let started = Instant::now();
    let response = reqwest::get(server.url("/files/fast.bin")).await.unwrap();
    let bytes = response.bytes().await.unwrap();

    assert_eq!(bytes.len(), 256 * 1024);
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "unpaced download took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_pacing_applies_to_requested_range_only() {
    let server = TestServer::start_with(|config| {
        config
            .files
            .delays
            .insert("slow.bin".to_string(), Duration::from_millis(400));
    })
    .await;
    let payload = patterned_bytes(512 * 1024);
    server.write_file("slow.bin", &payload);

    // Two 64 KiB chunks → 200 ms between chunks, regardless of file size.
    let started = Instant::now();
    let response = reqwest::Client::new()
        .get(server.url("/files/slow.bin"))
        .header(RANGE, "bytes=0-131071")
        .send()
        .await
        .unwrap();
    let bytes = response.bytes().await.unwrap();
    let elapsed = started.elapsed();

    assert_eq!(bytes.as_ref(), &payload[..131072]);
    assert!(
        elapsed >= Duration::from_millis(150) && elapsed < Duration::from_secs(2),
        "range pacing off target: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_empty_file_serves_zero_bytes() {
    let server = TestServer::start().await;
    server.write_file("empty.bin", b"");

    let response = reqwest::get(server.url("/files/empty.bin")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers().get(CONTENT_LENGTH).unwrap(), "0");
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_etag_is_stable_across_requests() {
    let server = TestServer::start().await;
    server.write_file("data.bin", &patterned_bytes(1000));

    let first = reqwest::get(server.url("/files/data.bin")).await.unwrap();
    let second = reqwest::get(server.url("/files/data.bin")).await.unwrap();
    assert_eq!(
        first.headers().get(ETAG).unwrap(),
        second.headers().get(ETAG).unwrap()
    );
}

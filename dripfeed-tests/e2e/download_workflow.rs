//! Download-client workflows: resumed transfers and concurrent slow streams

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::header::RANGE;

use crate::harness::{TestServer, patterned_bytes};

#[tokio::test]
async fn test_resumed_download_reassembles_the_file() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(300_000);
    server.write_file("resume.bin", &payload);
    let client = reqwest::Client::new();

    // First leg: the client "loses the connection" after 100000 bytes.
    let first = client
        .get(server.url("/files/resume.bin"))
        .header(RANGE, "bytes=0-99999")
        .send()
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::PARTIAL_CONTENT);
    let mut assembled = first.bytes().await.unwrap().to_vec();

    // Second leg: resume from where it stopped.
    let second = client
        .get(server.url("/files/resume.bin"))
        .header(RANGE, format!("bytes={}-", assembled.len()))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::PARTIAL_CONTENT);
    assembled.extend_from_slice(&second.bytes().await.unwrap());

    assert_eq!(assembled, payload);
}

#[tokio::test]
async fn test_concurrent_slow_downloads_run_independently() {
    let server = TestServer::start_with(|config| {
        config
            .files
            .delays
            .insert("a.bin".to_string(), Duration::from_millis(600));
        config
            .files
            .delays
            .insert("b.bin".to_string(), Duration::from_millis(600));
    })
    .await;
    server.write_file("a.bin", &patterned_bytes(128 * 1024));
    server.write_file("b.bin", &patterned_bytes(128 * 1024));
    let client = reqwest::Client::new();

    let started = Instant::now();
    let (first, second) = tokio::join!(
        async {
            client
                .get(server.url("/files/a.bin"))
                .send()
                .await
                .unwrap()
                .bytes()
                .await
                .unwrap()
        },
        async {
            client
                .get(server.url("/files/b.bin"))
                .send()
                .await
                .unwrap()
                .bytes()
                .await
                .unwrap()
        },
    );
    let elapsed = started.elapsed();

    assert_eq!(first.len(), 128 * 1024);
    assert_eq!(second.len(), 128 * 1024);
    // Run in parallel: the pair takes roughly one target duration, not two.
    assert!(
        elapsed < Duration::from_millis(1100),
        "slow downloads serialized: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_slow_download_does_not_block_other_requests() {
    let server = TestServer::start_with(|config| {
        config
            .files
            .delays
            .insert("slow.bin".to_string(), Duration::from_secs(1));
    })
    .await;
    server.write_file("slow.bin", &patterned_bytes(128 * 1024));
    let client = reqwest::Client::new();

    // Kick off the slow download without awaiting its completion.
    let slow = tokio::spawn({
        let client = client.clone();
        let url = server.url("/files/slow.bin");
        async move { client.get(url).send().await.unwrap().bytes().await.unwrap() }
    });
    tokio::time::sleep(Duration::from_millis(100)).await;

    // A quick request must not queue behind the paced stream.
    let started = Instant::now();
    let response = client
        .get(server.url("/echo_get?json=true"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        started.elapsed() < Duration::from_millis(500),
        "fast request stalled behind a slow download: {:?}",
        started.elapsed()
    );

    let body = slow.await.unwrap();
    assert_eq!(body.len(), 128 * 1024);
}

#[tokio::test]
async fn test_unknown_length_download_round_trips() {
    let server = TestServer::start().await;
    let payload = patterned_bytes(150_000);
    server.write_file("blob.bin", &payload);

    let response = reqwest::get(server.url("/files/blob.bin?no_content_length=true"))
        .await
        .unwrap();
    assert!(response.content_length().is_none());
    assert_eq!(response.bytes().await.unwrap().as_ref(), payload.as_slice());
}

//! Integration tests for the upload endpoints

use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::multipart::{Form, Part};

use crate::harness::TestServer;

#[tokio::test]
async fn test_upload_file_requires_file_field() {
    let server = TestServer::start().await;

    let form = Form::new().text("note", "no file attached");
    let response = reqwest::Client::new()
        .post(server.url("/upload_file"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "No file");
}

#[tokio::test]
async fn test_upload_file_without_multipart_body() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .post(server.url("/upload_file"))
        .body("not multipart")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(response.text().await.unwrap(), "No file");
}

#[tokio::test]
async fn test_upload_file_returns_form_fields() {
    let server = TestServer::start().await;

    let form = Form::new()
        .part(
            "file",
            Part::bytes(vec![0u8; 2048]).file_name("payload.bin"),
        )
        .text("description", "test payload")
        .text("version", "3");
    let response = reqwest::Client::new()
        .post(server.url("/upload_file"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["description"], "test payload");
    assert_eq!(body["version"], "3");
    assert!(body.get("file").is_none());
}

#[tokio::test]
async fn test_upload_binary_small_body_is_echoed() {
    let server = TestServer::start().await;

    let payload = "short upload body";
    let response = reqwest::Client::new()
        .post(server.url("/upload_binary"))
        .body(payload)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.unwrap(), payload);
}

#[tokio::test]
async fn test_upload_binary_large_body_returns_length() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .post(server.url("/upload_binary"))
        .body(vec![b'x'; 150])
        .send()
        .await
        .unwrap();

    assert_eq!(response.text().await.unwrap(), "150");
}

#[tokio::test]
async fn test_upload_binary_paces_consumption() {
    let server = TestServer::start().await;

    // 8 KiB = eight 1 KiB windows at 50 ms each ≈ 400 ms total.
    let started = Instant::now();
    let response = reqwest::Client::new()
        .post(server.url("/upload_binary"))
        .body(vec![b'y'; 8 * 1024])
        .send()
        .await
        .unwrap();

    assert_eq!(response.text().await.unwrap(), "8192");
    assert!(
        started.elapsed() >= Duration::from_millis(300),
        "upload finished too quickly: {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_upload_multi_returns_fields_not_files() {
    let server = TestServer::start().await;

    let form = Form::new()
        .part("first", Part::bytes(vec![1u8; 512]).file_name("a.bin"))
        .part("second", Part::bytes(vec![2u8; 512]).file_name("b.bin"))
        .text("tag", "pair");
    let response = reqwest::Client::new()
        .post(server.url("/upload_multi"))
        .multipart(form)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["tag"], "pair");
    assert!(body.get("first").is_none());
    assert!(body.get("second").is_none());
}

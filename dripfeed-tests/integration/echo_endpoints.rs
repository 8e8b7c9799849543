//! Integration tests for the echo endpoint surface

use reqwest::StatusCode;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, LOCATION};
use serde_json::json;

use crate::harness::TestServer;

#[tokio::test]
async fn test_index_streams_without_content_length() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().get(CONTENT_LENGTH).is_none());
    assert_eq!(response.text().await.unwrap(), "Local Test Server Running");
}

#[tokio::test]
async fn test_fail_returns_403() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/fail")).await.unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response.text().await.unwrap(), "Not authorized");
}

#[tokio::test]
async fn test_echo_post_reflects_json_body() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .post(server.url("/echo_post?src=test"))
        .json(&json!({"test": "data"}))
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["json"], json!({"test": "data"}));
    assert_eq!(body["data"], r#"{"test":"data"}"#);
    assert_eq!(body["args"]["src"], "test");
    assert_eq!(body["headers"]["Content-Type"], "application/json");
}

#[tokio::test]
async fn test_echo_post_with_unparseable_body() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .post(server.url("/echo_post"))
        .body("definitely not json")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["data"], "definitely not json");
    assert!(body["json"].is_null());
}

#[tokio::test]
async fn test_echo_get_json_mode() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .get(server.url("/echo_get?json=true&param=val"))
        .header("X-Header", "val")
        .send()
        .await
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();

    assert_eq!(body["args"]["param"], "val");
    assert_eq!(body["headers"]["X-Header"], "val");
    assert!(body.get("isPatch").is_none());
}

#[tokio::test]
async fn test_echo_get_legacy_text_mode() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/echo_get?param=val")).await.unwrap();
    let content_type = response.headers().get(CONTENT_TYPE).unwrap().clone();
    let body = response.text().await.unwrap();

    assert!(content_type.to_str().unwrap().starts_with("text/html"));
    assert!(
        body.starts_with("{'args': {'param': 'val'}, 'headers': {"),
        "unexpected legacy rendering: {body}"
    );
    assert!(body.ends_with('}'));
}

#[tokio::test]
async fn test_echo_get_patch_sets_is_patch() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .patch(server.url("/echo_get?json=true"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["isPatch"], true);

    let text = client
        .patch(server.url("/echo_get"))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(
        text.ends_with("'isPatch': True}"),
        "unexpected legacy rendering: {text}"
    );
}

#[tokio::test]
async fn test_redirect_points_at_echo_get() {
    let server = TestServer::start().await;

    let client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();
    let response = client.get(server.url("/redirect")).send().await.unwrap();

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.headers().get(LOCATION).unwrap(),
        "/echo_get?redirected=true"
    );
}

#[tokio::test]
async fn test_redirect_followed_lands_in_legacy_echo() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/redirect")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.starts_with("{'args': {'redirected': 'true'}"));
}

#[tokio::test]
async fn test_response_headers_echoes_repeated_params() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url(
        "/response-headers?X-Test=alpha&X-Test=beta&Free-Form=anything%20goes",
    ))
    .await
    .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let values: Vec<_> = response.headers().get_all("X-Test").iter().collect();
    assert_eq!(values, vec!["alpha", "beta"]);
    assert_eq!(
        response.headers().get("Free-Form").unwrap(),
        "anything goes"
    );
    assert_eq!(response.text().await.unwrap(), "Headers set");
}

#[tokio::test]
async fn test_response_headers_can_set_cookies() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/response-headers?Set-Cookie=session%3Dabc123"))
        .await
        .unwrap();
    assert_eq!(
        response.headers().get("Set-Cookie").unwrap(),
        "session=abc123"
    );
}

#[tokio::test]
async fn test_refresh_returns_fixed_token() {
    let server = TestServer::start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(server.url("/refresh"))
        .json(&json!({"refresh_token": "old"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["access_token"], "new_access_token");
    assert_eq!(body["expires_in"], 3600);
    assert_eq!(body["post_body"], json!({"refresh_token": "old"}));
}

#[tokio::test]
async fn test_cookies_are_echoed() {
    let server = TestServer::start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .get(server.url("/cookies"))
        .header("Cookie", "session=abc; theme=dark")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["cookies"]["session"], "abc");
    assert_eq!(body["cookies"]["theme"], "dark");
}

#[tokio::test]
async fn test_status_codes_pass_through() {
    let server = TestServer::start().await;

    for code in [204u16, 301, 404, 418, 500, 503] {
        let response = reqwest::get(server.url(&format!("/status/{code}")))
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), code);
    }
}

#[tokio::test]
async fn test_unknown_path_is_404() {
    let server = TestServer::start().await;

    let response = reqwest::get(server.url("/definitely-not-a-route"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

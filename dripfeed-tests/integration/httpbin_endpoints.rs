//! Integration tests for the httpbin-compatible surface

use serde_json::json;

use crate::harness::TestServer;

#[tokio::test]
async fn test_get_reflects_request_metadata() {
    let server = TestServer::start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .get(server.url("/get?a=1&b=two"))
        .header("X-Client", "under-test")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["args"]["a"], "1");
    assert_eq!(body["args"]["b"], "two");
    assert_eq!(body["headers"]["X-Client"], "under-test");
    assert_eq!(body["origin"], "127.0.0.1");
    assert_eq!(
        body["url"],
        format!("http://{}/get?a=1&b=two", server.addr)
    );
    // GET carries no body-derived keys
    assert!(body.get("data").is_none());
    assert!(body.get("json").is_none());
}

#[tokio::test]
async fn test_post_with_form_body() {
    let server = TestServer::start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(server.url("/post"))
        .form(&[("field", "value"), ("other", "2")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["form"]["field"], "value");
    assert_eq!(body["form"]["other"], "2");
    assert_eq!(body["data"], "");
    assert!(body["json"].is_null());
    assert_eq!(body["files"], json!({}));
}

#[tokio::test]
async fn test_post_with_json_body_keeps_raw_data() {
    let server = TestServer::start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .post(server.url("/post"))
        .json(&json!({"k": "v"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["json"], json!({"k": "v"}));
    assert_eq!(body["data"], r#"{"k":"v"}"#);
    assert_eq!(body["form"], json!({}));
}

#[tokio::test]
async fn test_put_json_blanks_raw_data() {
    let server = TestServer::start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .put(server.url("/put"))
        .json(&json!({"k": "v"}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["json"], json!({"k": "v"}));
    assert_eq!(body["data"], "");
}

#[tokio::test]
async fn test_put_json_is_parsed_without_content_type() {
    let server = TestServer::start().await;

    // Best-effort JSON parsing applies even without the JSON Content-Type.
    let body: serde_json::Value = reqwest::Client::new()
        .put(server.url("/put"))
        .body(r#"{"sneaky": true}"#)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["json"], json!({"sneaky": true}));
    assert_eq!(body["data"], "");
}

#[tokio::test]
async fn test_put_raw_body_survives_when_nothing_parses() {
    let server = TestServer::start().await;

    let body: serde_json::Value = reqwest::Client::new()
        .put(server.url("/put"))
        .body("plain payload")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["data"], "plain payload");
    assert!(body["json"].is_null());
    assert_eq!(body["form"], json!({}));
}

#[tokio::test]
async fn test_patch_and_delete_echo_bodies() {
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    let body: serde_json::Value = client
        .patch(server.url("/patch"))
        .form(&[("p", "q")])
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["form"]["p"], "q");
    assert_eq!(body["data"], "");

    let body: serde_json::Value = client
        .delete(server.url("/delete?id=42"))
        .body("goodbye")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["args"]["id"], "42");
    assert_eq!(body["data"], "goodbye");
}

#[tokio::test]
async fn test_wrong_method_is_rejected() {
    let server = TestServer::start().await;

    let response = reqwest::Client::new()
        .get(server.url("/post"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::METHOD_NOT_ALLOWED);
}

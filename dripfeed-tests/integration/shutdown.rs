//! Graceful shutdown behavior

use std::time::Duration;

use crate::harness::TestServer;

#[tokio::test]
async fn test_shutdown_endpoint_stops_the_server() {
    let server = TestServer::start().await;

    let root_url = server.url("/");
    let response = reqwest::Client::new()
        .post(server.url("/shutdown"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.text().await.unwrap(), "Server shutting down...");

    // The serve loop must wind down on its own once the response is out.
    let result = tokio::time::timeout(Duration::from_secs(5), server.task)
        .await
        .expect("server did not shut down in time")
        .expect("server task panicked");
    assert!(result.is_ok(), "serve loop exited with error: {result:?}");

    // New connections are no longer accepted.
    let error = reqwest::Client::new()
        .get(root_url)
        .timeout(Duration::from_secs(1))
        .send()
        .await;
    assert!(error.is_err());
}

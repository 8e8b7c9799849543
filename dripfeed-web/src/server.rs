//! Server wiring for the dripfeed test host
//!
//! Binds the endpoint surface to handlers, owns the shared read-only
//! configuration and the graceful-shutdown hook. Every request runs as its
//! own task; a paced download never blocks acceptance of new connections.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::response::Response;
use axum::routing::{delete, get, patch, post, put};
use dripfeed_core::ServerConfig;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::CorsLayer;
use tracing::info;

use crate::handlers::utils::html_text;
use crate::handlers::{
    cookies, echo_get, echo_post, fail, httpbin_delete, httpbin_get, httpbin_patch, httpbin_post,
    httpbin_put, index, redirect_to_echo, refresh, response_headers, serve_file, status_code,
    upload_binary, upload_file, upload_multi,
};

/// Shared application state: the read-only config plus the shutdown trigger.
///
/// Cloned into every handler invocation; nothing here is mutable after
/// startup, so no locking is involved.
#[derive(Clone)]
pub struct AppState {
    /// Process-wide configuration, read-only after startup
    pub config: Arc<ServerConfig>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl AppState {
    fn new(config: ServerConfig) -> (Self, watch::Receiver<bool>) {
        let (shutdown, shutdown_rx) = watch::channel(false);
        (
            Self {
                config: Arc::new(config),
                shutdown: Arc::new(shutdown),
            },
            shutdown_rx,
        )
    }

    /// Requests graceful shutdown of the serve loop.
    ///
    /// A no-op if the loop already exited.
    pub fn request_shutdown(&self) {
        let _ = self.shutdown.send(true);
    }
}

/// `POST /shutdown` — triggers graceful termination.
///
/// The response is delivered before the accept loop stops.
async fn shutdown_endpoint(State(state): State<AppState>) -> Response {
    info!("shutdown requested");
    state.request_shutdown();
    html_text("Server shutting down...")
}

/// Builds the full endpoint surface over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/fail", get(fail))
        .route("/echo_post", post(echo_post))
        .route("/echo_get", get(echo_get).patch(echo_get))
        .route("/redirect", get(redirect_to_echo))
        .route("/response-headers", get(response_headers))
        .route("/refresh", post(refresh))
        .route("/get", get(httpbin_get))
        .route("/post", post(httpbin_post))
        .route("/put", put(httpbin_put))
        .route("/patch", patch(httpbin_patch))
        .route("/delete", delete(httpbin_delete))
        .route("/cookies", get(cookies))
        .route("/status/{code}", get(status_code))
        .route("/upload_file", post(upload_file))
        .route("/upload_binary", post(upload_binary))
        .route("/upload_multi", post(upload_multi))
        .route("/files/{*filename}", get(serve_file))
        .route("/shutdown", post(shutdown_endpoint))
        .layer(CatchPanicLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the configured address and serves until shutdown.
///
/// # Errors
///
/// - `std::io::Error` - If the address cannot be bound or the accept loop fails
pub async fn run_server(config: ServerConfig) -> std::io::Result<()> {
    let listener = TcpListener::bind(config.http.bind_address).await?;
    serve_with_listener(listener, config).await
}

/// Serves on an already-bound listener until shutdown.
///
/// Tests bind port 0 themselves and read the ephemeral address off the
/// listener before handing it over.
///
/// # Errors
///
/// - `std::io::Error` - If the accept loop fails
pub async fn serve_with_listener(listener: TcpListener, config: ServerConfig) -> std::io::Result<()> {
    let (state, mut shutdown_rx) = AppState::new(config);
    let app = router(state);

    let addr = listener.local_addr()?;
    info!("Dripfeed test server running on http://{addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move {
        let _ = shutdown_rx.changed().await;
    })
    .await
}

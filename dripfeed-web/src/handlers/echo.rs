//! Stateless echo endpoints
//!
//! Reflect request metadata back at the client so client-side request
//! construction can be asserted against what actually arrived on the wire.

use std::convert::Infallible;

use axum::body::Body;
use axum::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode, Uri, header};
use bytes::Bytes;
use axum::response::{IntoResponse, Json, Response};
use futures::stream;
use hyper::ext::ReasonPhrase;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::utils::{
    LegacyValue, args_json, args_pairs, body_view, echo_headers, headers_json, html_text,
    legacy_mapping_repr, pairs_to_json, query_pairs, query_value,
};

/// `GET /` — liveness text delivered as a single-chunk stream.
///
/// Deliberately carries no Content-Length: clients must tolerate responses
/// of undeclared length.
pub async fn index() -> Response {
    let chunks = stream::iter([Ok::<_, Infallible>(Bytes::from_static(
        b"Local Test Server Running",
    ))]);
    let mut response = Response::new(Body::from_stream(chunks));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// `GET /fail` — 403 whose reason phrase is the non-canonical uppercase
/// `FORBIDDEN`, for clients that must not hardcode the standard phrasing.
pub async fn fail() -> Response {
    let mut response = html_text("Not authorized");
    *response.status_mut() = StatusCode::FORBIDDEN;
    response
        .extensions_mut()
        .insert(ReasonPhrase::from_static(b"FORBIDDEN"));
    response
}

/// Response shape of `/echo_post`.
#[derive(Serialize)]
pub struct EchoPostBody {
    /// Flat query mapping
    pub args: Map<String, Value>,
    /// Raw decoded body text
    pub data: String,
    /// Best-effort parsed JSON body, null when not parseable
    pub json: Value,
    /// Every incoming header, Title-Cased
    pub headers: Map<String, Value>,
}

/// `POST /echo_post` — reflects query, body and headers as JSON.
pub async fn echo_post(uri: Uri, headers: HeaderMap, body: Bytes) -> Json<EchoPostBody> {
    let view = body_view(&headers, &body);
    Json(EchoPostBody {
        args: args_json(&uri),
        data: view.data,
        json: view.json,
        headers: headers_json(&headers),
    })
}

/// Response shape of `/echo_get?json=true`.
#[derive(Serialize)]
pub struct EchoGetBody {
    /// Flat query mapping
    pub args: Map<String, Value>,
    /// Every incoming header, Title-Cased
    pub headers: Map<String, Value>,
    /// Present (and true) only for PATCH requests
    #[serde(rename = "isPatch", skip_serializing_if = "Option::is_none")]
    pub is_patch: Option<bool>,
}

/// `GET|PATCH /echo_get` — JSON when `json=true`, otherwise the legacy
/// native-mapping rendering.
///
/// The non-JSON branch is a byte-exact compatibility contract (see
/// [`legacy_mapping_repr`]); do not "fix" it to JSON.
pub async fn echo_get(method: Method, uri: Uri, headers: HeaderMap) -> Response {
    let args = args_pairs(&uri);
    let header_pairs = echo_headers(&headers);
    let is_patch = method == Method::PATCH;

    if query_value(&uri, "json").as_deref() == Some("true") {
        return Json(EchoGetBody {
            args: pairs_to_json(&args),
            headers: pairs_to_json(&header_pairs),
            is_patch: is_patch.then_some(true),
        })
        .into_response();
    }

    let mut entries = vec![
        ("args", LegacyValue::Table(args)),
        ("headers", LegacyValue::Table(header_pairs)),
    ];
    if is_patch {
        entries.push(("isPatch", LegacyValue::Bool(true)));
    }
    html_text(legacy_mapping_repr(&entries))
}

/// `GET /redirect` — 302 to `/echo_get?redirected=true`.
pub async fn redirect_to_echo() -> Response {
    let mut response = Response::new(Body::empty());
    *response.status_mut() = StatusCode::FOUND;
    response.headers_mut().insert(
        header::LOCATION,
        HeaderValue::from_static("/echo_get?redirected=true"),
    );
    response
}

/// `GET /response-headers` — copies every query parameter verbatim into a
/// response header, repeats included. Used to drive client cookie handling
/// through arbitrary `Set-Cookie`-style headers.
pub async fn response_headers(uri: Uri) -> Response {
    let mut response = html_text("Headers set");
    for (name, value) in query_pairs(&uri) {
        let Ok(name) = HeaderName::try_from(name.as_str()) else {
            debug!("skipping unrepresentable header name {name:?}");
            continue;
        };
        let Ok(value) = HeaderValue::try_from(value.as_str()) else {
            debug!("skipping unrepresentable header value for {name}");
            continue;
        };
        response.headers_mut().append(name, value);
    }
    response
}

/// Response shape of `/refresh`.
#[derive(Serialize)]
pub struct RefreshBody {
    /// Flat query mapping
    pub args: Map<String, Value>,
    /// Every incoming header, Title-Cased
    pub headers: Map<String, Value>,
    /// Best-effort parsed JSON request body
    pub post_body: Value,
    /// Fixed token value clients exchange the old one for
    pub access_token: String,
    /// Fixed token lifetime in seconds
    pub expires_in: u64,
}

/// `POST /refresh` — token-refresh stub returning a fixed new token.
pub async fn refresh(uri: Uri, headers: HeaderMap, body: Bytes) -> Json<RefreshBody> {
    let view = body_view(&headers, &body);
    Json(RefreshBody {
        args: args_json(&uri),
        headers: headers_json(&headers),
        post_body: view.json,
        access_token: "new_access_token".to_string(),
        expires_in: 3600,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_fail_carries_custom_reason_phrase() {
        let response = fail().await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        let phrase = response
            .extensions()
            .get::<ReasonPhrase>()
            .expect("reason phrase extension");
        assert_eq!(phrase.as_bytes(), b"FORBIDDEN");
    }

    #[tokio::test]
    async fn test_redirect_location() {
        let response = redirect_to_echo().await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "/echo_get?redirected=true"
        );
    }

    #[tokio::test]
    async fn test_response_headers_appends_repeats() {
        let uri: Uri = "/response-headers?X-Test=a&X-Test=b".parse().unwrap();
        let response = response_headers(uri).await;
        let values: Vec<_> = response.headers().get_all("X-Test").iter().collect();
        assert_eq!(values, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_echo_get_legacy_rendering() {
        let uri: Uri = "/echo_get?redirected=true".parse().unwrap();
        let response = echo_get(Method::GET, uri, HeaderMap::new()).await;
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(
            body.as_ref(),
            b"{'args': {'redirected': 'true'}, 'headers': {}}"
        );
    }

    #[tokio::test]
    async fn test_echo_get_patch_marker() {
        let uri: Uri = "/echo_get".parse().unwrap();
        let response = echo_get(Method::PATCH, uri, HeaderMap::new()).await;
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), b"{'args': {}, 'headers': {}, 'isPatch': True}");
    }
}

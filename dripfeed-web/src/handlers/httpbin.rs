//! httpbin.org-compatible endpoints
//!
//! JSON shapes mirror httpbin closely enough that clients written against
//! the real service run unchanged against this server. Body-derived fields
//! follow a strict precedence: parsed JSON > parsed form > raw text.

use std::net::SocketAddr;

use axum::body::Body;
use axum::extract::{ConnectInfo, Path};
use bytes::Bytes;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{Json, Response};
use hyper::ext::ReasonPhrase;
use serde::Serialize;
use serde_json::{Map, Value};

use super::utils::{BodyView, args_json, body_view, cookie_pairs, headers_json, pairs_to_json, request_url};

/// Response shape of `/get`: request metadata without body-derived fields.
#[derive(Serialize)]
pub struct MetaEchoBody {
    /// Flat query mapping
    pub args: Map<String, Value>,
    /// Every incoming header, Title-Cased
    pub headers: Map<String, Value>,
    /// Peer IP address
    pub origin: String,
    /// Full request URL as the client addressed it
    pub url: String,
}

/// Response shape of `/post`, `/put`, `/patch` and `/delete`.
#[derive(Serialize)]
pub struct BodyEchoBody {
    /// Flat query mapping
    pub args: Map<String, Value>,
    /// Raw body text, subject to the JSON > form > raw precedence
    pub data: String,
    /// Always empty; file parts are not echoed
    pub files: Map<String, Value>,
    /// Parsed urlencoded form fields
    pub form: Map<String, Value>,
    /// Every incoming header, Title-Cased
    pub headers: Map<String, Value>,
    /// Best-effort parsed JSON body, null when not parseable
    pub json: Value,
    /// Peer IP address
    pub origin: String,
    /// Full request URL as the client addressed it
    pub url: String,
}

/// `GET /get` — mimics httpbin.org/get.
pub async fn httpbin_get(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
) -> Json<MetaEchoBody> {
    Json(MetaEchoBody {
        args: args_json(&uri),
        headers: headers_json(&headers),
        origin: peer.ip().to_string(),
        url: request_url(&headers, &uri),
    })
}

// The POST variant always keeps the raw text (unless form parsing consumed
// the body); PUT/PATCH/DELETE blank it whenever JSON or form data parsed.
fn body_echo(
    peer: SocketAddr,
    uri: &Uri,
    headers: &HeaderMap,
    view: BodyView,
    raw_data_alongside_parsed: bool,
) -> BodyEchoBody {
    let data = if raw_data_alongside_parsed || (view.json.is_null() && view.form.is_empty()) {
        view.data
    } else {
        String::new()
    };

    BodyEchoBody {
        args: args_json(uri),
        data,
        files: Map::new(),
        form: view.form,
        headers: headers_json(headers),
        json: view.json,
        origin: peer.ip().to_string(),
        url: request_url(headers, uri),
    }
}

/// `POST /post` — mimics httpbin.org/post.
pub async fn httpbin_post(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<BodyEchoBody> {
    let view = body_view(&headers, &body);
    Json(body_echo(peer, &uri, &headers, view, true))
}

/// `PUT /put` — mimics httpbin.org/put.
pub async fn httpbin_put(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<BodyEchoBody> {
    let view = body_view(&headers, &body);
    Json(body_echo(peer, &uri, &headers, view, false))
}

/// `PATCH /patch` — mimics httpbin.org/patch.
pub async fn httpbin_patch(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<BodyEchoBody> {
    let view = body_view(&headers, &body);
    Json(body_echo(peer, &uri, &headers, view, false))
}

/// `DELETE /delete` — mimics httpbin.org/delete.
pub async fn httpbin_delete(
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Json<BodyEchoBody> {
    let view = body_view(&headers, &body);
    Json(body_echo(peer, &uri, &headers, view, false))
}

/// Response shape of `/cookies`.
#[derive(Serialize)]
pub struct CookiesBody {
    /// Cookie name → value pairs from the `Cookie` header
    pub cookies: Map<String, Value>,
}

/// `GET /cookies` — mimics httpbin.org/cookies.
pub async fn cookies(headers: HeaderMap) -> Json<CookiesBody> {
    Json(CookiesBody {
        cookies: pairs_to_json(&cookie_pairs(&headers)),
    })
}

/// `GET /status/{code}` — empty body with the requested status.
///
/// 400 and 403 carry fixed non-canonical reason phrases (`BAD REQUEST`,
/// `FORBIDDEN`); codes that are not valid HTTP statuses collapse to 400.
pub async fn status_code(Path(code): Path<u16>) -> Response {
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_REQUEST);

    let mut response = Response::new(Body::empty());
    *response.status_mut() = status;
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    match status {
        StatusCode::BAD_REQUEST => {
            response
                .extensions_mut()
                .insert(ReasonPhrase::from_static(b"BAD REQUEST"));
        }
        StatusCode::FORBIDDEN => {
            response
                .extensions_mut()
                .insert(ReasonPhrase::from_static(b"FORBIDDEN"));
        }
        _ => {}
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 55555))
    }

    #[test]
    fn test_body_echo_precedence_json_wins() {
        let headers = HeaderMap::new();
        let uri: Uri = "/put".parse().unwrap();
        let view = body_view(&headers, br#"{"k":"v"}"#);
        let echoed = body_echo(peer(), &uri, &headers, view, false);
        assert_eq!(echoed.data, "");
        assert_eq!(echoed.json["k"], "v");
    }

    #[test]
    fn test_body_echo_raw_fallback() {
        let headers = HeaderMap::new();
        let uri: Uri = "/put".parse().unwrap();
        let view = body_view(&headers, b"raw payload");
        let echoed = body_echo(peer(), &uri, &headers, view, false);
        assert_eq!(echoed.data, "raw payload");
        assert!(echoed.json.is_null());
        assert!(echoed.form.is_empty());
    }

    #[test]
    fn test_body_echo_post_keeps_raw_alongside_json() {
        let headers = HeaderMap::new();
        let uri: Uri = "/post".parse().unwrap();
        let view = body_view(&headers, br#"{"k":"v"}"#);
        let echoed = body_echo(peer(), &uri, &headers, view, true);
        assert_eq!(echoed.data, r#"{"k":"v"}"#);
        assert_eq!(echoed.json["k"], "v");
    }

    #[tokio::test]
    async fn test_status_code_reason_phrases() {
        let response = status_code(Path(403)).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert_eq!(
            response.extensions().get::<ReasonPhrase>().unwrap().as_bytes(),
            b"FORBIDDEN"
        );

        let response = status_code(Path(400)).await;
        assert_eq!(
            response.extensions().get::<ReasonPhrase>().unwrap().as_bytes(),
            b"BAD REQUEST"
        );

        let response = status_code(Path(204)).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(response.extensions().get::<ReasonPhrase>().is_none());
    }
}

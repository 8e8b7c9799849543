//! Utility functions for request introspection and echo formatting
//!
//! The echo endpoints reproduce what the emulated host reported about a
//! request: decoded query pairs, Title-Cased header names, a best-effort
//! JSON body, and the legacy native-mapping rendering some clients still
//! assert on verbatim.

use axum::body::Body;
use axum::http::{HeaderMap, HeaderValue, Uri, header};
use axum::response::Response;
use serde_json::{Map, Value};
use url::form_urlencoded;

/// Decoded query pairs in arrival order, duplicates preserved.
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|query| form_urlencoded::parse(query.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// Query parameters as a flat mapping: last value wins on duplicate keys,
/// first-seen position is kept.
pub fn args_pairs(uri: &Uri) -> Vec<(String, String)> {
    let mut out: Vec<(String, String)> = Vec::new();
    for (key, value) in query_pairs(uri) {
        match out.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, existing)) => *existing = value,
            None => out.push((key, value)),
        }
    }
    out
}

/// First value of the query parameter `name`, decoded.
pub fn query_value(uri: &Uri, name: &str) -> Option<String> {
    query_pairs(uri)
        .into_iter()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value)
}

/// Flat query mapping as a JSON object.
pub fn args_json(uri: &Uri) -> Map<String, Value> {
    pairs_to_json(&args_pairs(uri))
}

/// Incoming headers as Title-Cased name/value pairs. Repeated values are
/// joined with ", ", the way the emulated host's gateway presented them.
pub fn echo_headers(headers: &HeaderMap) -> Vec<(String, String)> {
    let mut out = Vec::new();
    for name in headers.keys() {
        let value = headers
            .get_all(name)
            .iter()
            .map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned())
            .collect::<Vec<_>>()
            .join(", ");
        out.push((titlecase_header_name(name.as_str()), value));
    }
    out
}

/// Incoming headers as a JSON object with Title-Cased names.
pub fn headers_json(headers: &HeaderMap) -> Map<String, Value> {
    pairs_to_json(&echo_headers(headers))
}

/// `x-request-id` → `X-Request-Id`.
pub fn titlecase_header_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Cookie pairs from the `Cookie` header; the first value wins per name.
pub fn cookie_pairs(headers: &HeaderMap) -> Vec<(String, String)> {
    let Some(raw) = headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
    else {
        return Vec::new();
    };

    let mut out: Vec<(String, String)> = Vec::new();
    for piece in raw.split(';') {
        if let Some((name, value)) = piece.trim().split_once('=') {
            if !out.iter().any(|(existing, _)| existing == name) {
                out.push((name.to_string(), value.to_string()));
            }
        }
    }
    out
}

/// Ordered pairs collected into a JSON object.
pub fn pairs_to_json(pairs: &[(String, String)]) -> Map<String, Value> {
    pairs
        .iter()
        .map(|(key, value)| (key.clone(), Value::String(value.clone())))
        .collect()
}

/// A request body the way the emulated host's framework exposed it.
///
/// Form-encoded bodies (urlencoded or multipart) are consumed by form
/// parsing and leave `data` empty and `json` null; everything else keeps
/// the raw text alongside a best-effort JSON interpretation that never
/// fails, only falls back to null.
pub struct BodyView {
    /// Raw decoded body text, empty when form parsing consumed the body
    pub data: String,
    /// Best-effort parsed JSON body, `Null` when not parseable
    pub json: Value,
    /// Parsed `application/x-www-form-urlencoded` fields
    pub form: Map<String, Value>,
}

/// Interprets `body` under the request's Content-Type. See [`BodyView`].
pub fn body_view(headers: &HeaderMap, body: &[u8]) -> BodyView {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_ascii_lowercase();

    if content_type.starts_with("application/x-www-form-urlencoded") {
        let form = form_urlencoded::parse(body)
            .into_owned()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();
        return BodyView {
            data: String::new(),
            json: Value::Null,
            form,
        };
    }

    if content_type.starts_with("multipart/form-data") {
        return BodyView {
            data: String::new(),
            json: Value::Null,
            form: Map::new(),
        };
    }

    let json = if body.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(body).unwrap_or(Value::Null)
    };
    BodyView {
        data: String::from_utf8_lossy(body).into_owned(),
        json,
        form: Map::new(),
    }
}

/// Full request URL as the client addressed it, rebuilt from the Host header.
pub fn request_url(headers: &HeaderMap, uri: &Uri) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("127.0.0.1");
    let path_and_query = uri
        .path_and_query()
        .map(|paq| paq.as_str())
        .unwrap_or("/");
    format!("http://{host}{path_and_query}")
}

/// A value renderable in the legacy debug form of `/echo_get`.
pub enum LegacyValue {
    /// A nested string→string table
    Table(Vec<(String, String)>),
    /// A bare boolean, rendered `True`/`False`
    Bool(bool),
}

/// Renders a mapping the way the emulated host's runtime stringified its
/// native dictionaries: single-quoted strings, capitalized booleans,
/// insertion-ordered keys. Clients assert on this exact string form, so it
/// is a fixed formatting contract, not a debug convenience.
pub fn legacy_mapping_repr(entries: &[(&str, LegacyValue)]) -> String {
    let mut out = String::from("{");
    for (i, (key, value)) in entries.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&quote_legacy(key));
        out.push_str(": ");
        match value {
            LegacyValue::Bool(flag) => out.push_str(if *flag { "True" } else { "False" }),
            LegacyValue::Table(pairs) => {
                out.push('{');
                for (j, (name, text)) in pairs.iter().enumerate() {
                    if j > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(&quote_legacy(name));
                    out.push_str(": ");
                    out.push_str(&quote_legacy(text));
                }
                out.push('}');
            }
        }
    }
    out.push('}');
    out
}

// Single quotes by default, switching to double quotes when the text holds
// a single quote but no double quote. Same rules the source runtime used.
fn quote_legacy(text: &str) -> String {
    let use_double = text.contains('\'') && !text.contains('"');
    let quote = if use_double { '"' } else { '\'' };

    let mut out = String::with_capacity(text.len() + 2);
    out.push(quote);
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// A plain `text/html` response, the default body framing of the emulated
/// host for non-JSON endpoints.
pub fn html_text(text: impl Into<String>) -> Response {
    let mut response = Response::new(Body::from(text.into()));
    response.headers_mut().insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderName;

    use super::*;

    #[test]
    fn test_titlecase_header_name() {
        assert_eq!(titlecase_header_name("x-request-id"), "X-Request-Id");
        assert_eq!(titlecase_header_name("host"), "Host");
        assert_eq!(titlecase_header_name("content-type"), "Content-Type");
    }

    #[test]
    fn test_args_pairs_last_value_wins_keeps_position() {
        let uri: Uri = "/echo_get?a=1&b=2&a=3".parse().unwrap();
        assert_eq!(
            args_pairs(&uri),
            vec![
                ("a".to_string(), "3".to_string()),
                ("b".to_string(), "2".to_string()),
            ]
        );
    }

    #[test]
    fn test_query_value_takes_first() {
        let uri: Uri = "/echo_get?json=true&json=false".parse().unwrap();
        assert_eq!(query_value(&uri, "json").as_deref(), Some("true"));
        assert_eq!(query_value(&uri, "missing"), None);
    }

    #[test]
    fn test_query_pairs_decode_percent_and_plus() {
        let uri: Uri = "/echo_get?msg=hello+world&sym=%26".parse().unwrap();
        assert_eq!(
            query_pairs(&uri),
            vec![
                ("msg".to_string(), "hello world".to_string()),
                ("sym".to_string(), "&".to_string()),
            ]
        );
    }

    #[test]
    fn test_echo_headers_titlecases_and_joins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static("x-header"),
            HeaderValue::from_static("val"),
        );
        headers.append(
            HeaderName::from_static("x-multi"),
            HeaderValue::from_static("a"),
        );
        headers.append(
            HeaderName::from_static("x-multi"),
            HeaderValue::from_static("b"),
        );

        let echoed = echo_headers(&headers);
        assert!(echoed.contains(&("X-Header".to_string(), "val".to_string())));
        assert!(echoed.contains(&("X-Multi".to_string(), "a, b".to_string())));
    }

    #[test]
    fn test_cookie_pairs_first_value_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("session=abc; theme=dark; session=def"),
        );
        assert_eq!(
            cookie_pairs(&headers),
            vec![
                ("session".to_string(), "abc".to_string()),
                ("theme".to_string(), "dark".to_string()),
            ]
        );
    }

    #[test]
    fn test_body_view_json_is_best_effort() {
        let headers = HeaderMap::new();
        let view = body_view(&headers, br#"{"test":"data"}"#);
        assert_eq!(view.data, r#"{"test":"data"}"#);
        assert_eq!(view.json["test"], "data");

        let view = body_view(&headers, b"not json");
        assert_eq!(view.data, "not json");
        assert!(view.json.is_null());
    }

    #[test]
    fn test_body_view_form_consumes_body() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/x-www-form-urlencoded"),
        );
        let view = body_view(&headers, b"a=1&b=two");
        assert_eq!(view.data, "");
        assert!(view.json.is_null());
        assert_eq!(view.form["a"], "1");
        assert_eq!(view.form["b"], "two");
    }

    #[test]
    fn test_legacy_mapping_repr() {
        let entries = [
            (
                "args",
                LegacyValue::Table(vec![("redirected".to_string(), "true".to_string())]),
            ),
            ("headers", LegacyValue::Table(vec![])),
            ("isPatch", LegacyValue::Bool(true)),
        ];
        assert_eq!(
            legacy_mapping_repr(&entries),
            "{'args': {'redirected': 'true'}, 'headers': {}, 'isPatch': True}"
        );
    }

    #[test]
    fn test_legacy_quoting_switches_on_single_quote() {
        let entries = [(
            "args",
            LegacyValue::Table(vec![("note".to_string(), "it's fine".to_string())]),
        )];
        assert_eq!(
            legacy_mapping_repr(&entries),
            "{'args': {'note': \"it's fine\"}}"
        );
    }
}

//! Upload endpoints
//!
//! Exercise client upload paths: multipart forms and a deliberately slow
//! binary consumer that applies backpressure while the client is still
//! sending, so upload-progress and timeout logic can be tested for real.

use axum::body::Body;
use axum::extract::Multipart;
use axum::extract::State;
use axum::extract::multipart::MultipartRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use futures::StreamExt;
use serde_json::{Map, Value};
use tokio::time::sleep;
use tracing::{info, warn};

use super::utils::html_text;
use crate::server::AppState;

/// `POST /upload_file` — single multipart upload.
///
/// A part named `file` carrying a filename is required; its absence yields
/// 404 with body `No file` (404-as-validation-error, kept for client
/// compatibility). On success the non-file form fields come back as JSON.
pub async fn upload_file(multipart: Result<Multipart, MultipartRejection>) -> Response {
    let Ok(mut multipart) = multipart else {
        return (StatusCode::NOT_FOUND, "No file").into_response();
    };

    let mut file_seen = false;
    let mut fields = Map::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            if name == "file" {
                file_seen = true;
            }
            match field.bytes().await {
                Ok(contents) => info!("received file part {name:?} ({} bytes)", contents.len()),
                Err(error) => warn!("failed to read file part {name:?}: {error}"),
            }
        } else if let Ok(value) = field.bytes().await {
            fields.insert(
                name,
                Value::String(String::from_utf8_lossy(&value).into_owned()),
            );
        }
    }

    if !file_seen {
        return (StatusCode::NOT_FOUND, "No file").into_response();
    }
    info!("upload_file fields: {fields:?}");
    Json(fields).into_response()
}

/// `POST /upload_multi` — multipart upload with any number of file parts.
///
/// File contents are drained but not echoed; the response is the JSON map
/// of non-file form fields.
pub async fn upload_multi(multipart: Result<Multipart, MultipartRejection>) -> Response {
    let Ok(mut multipart) = multipart else {
        return Json(Map::new()).into_response();
    };

    let mut file_names = Vec::new();
    let mut fields = Map::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        if field.file_name().is_some() {
            file_names.push(name);
            if let Err(error) = field.bytes().await {
                warn!("failed to read file part: {error}");
            }
        } else if let Ok(value) = field.bytes().await {
            fields.insert(
                name,
                Value::String(String::from_utf8_lossy(&value).into_owned()),
            );
        }
    }

    info!("upload_multi files: {file_names:?}");
    Json(fields).into_response()
}

/// `POST /upload_binary` — consumes the request body at a deliberately
/// slow pace: one sleep per consumed window (1 KiB by default), applied
/// while the client is still uploading.
///
/// Bodies under the inline limit are echoed back as text; longer bodies
/// are reduced to their decimal byte length.
pub async fn upload_binary(State(state): State<AppState>, body: Body) -> Response {
    let window = state.config.upload.chunk_size;
    let delay = state.config.upload.chunk_delay;
    let inline_limit = state.config.upload.inline_body_limit;

    let mut stream = body.into_data_stream();
    let mut data: Vec<u8> = Vec::new();
    let mut paced_through = 0usize;
    while let Some(frame) = stream.next().await {
        let frame = match frame {
            Ok(frame) => frame,
            Err(error) => {
                warn!("upload body aborted: {error}");
                return StatusCode::BAD_REQUEST.into_response();
            }
        };
        data.extend_from_slice(&frame);
        // Sleep once per full window as it arrives, not once up front, so
        // the client experiences sustained backpressure.
        while data.len() - paced_through >= window {
            paced_through += window;
            sleep(delay).await;
        }
    }
    if paced_through < data.len() {
        sleep(delay).await; // trailing partial window
    }

    info!("upload_binary received {} bytes", data.len());
    if data.len() < inline_limit {
        html_text(String::from_utf8_lossy(&data).into_owned())
    } else {
        html_text(data.len().to_string())
    }
}

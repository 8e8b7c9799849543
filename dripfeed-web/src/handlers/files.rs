//! Range-aware paced file delivery
//!
//! `GET /files/{filename}` resolves a file under the configured root,
//! computes the effective byte range, and streams it in fixed-size chunks
//! with an inter-chunk delay chosen to spread the transfer across the
//! file's configured target duration. Time-to-first-byte stays low; only
//! the gaps between chunks carry the delay.

use std::io::SeekFrom;
use std::time::UNIX_EPOCH;

use axum::body::Body;
use axum::extract::{Path as UrlPath, State};
use bytes::Bytes;
use axum::http::{HeaderMap, HeaderValue, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use chrono::{DateTime, Utc};
use dripfeed_core::pacing::ChunkPlan;
use dripfeed_core::range::{self, ResolvedRange};
use futures::{Stream, stream};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tracing::{debug, info, warn};

use super::utils::query_value;
use crate::server::AppState;

/// Failures terminating a `/files` request before streaming starts.
#[derive(Debug, Error)]
pub enum FileServeError {
    /// No such file under the configured root.
    #[error("file not found: {name}")]
    NotFound {
        /// Requested filename
        name: String,
    },

    /// The resolved range is empty or starts past the end of the file.
    #[error("range not satisfiable for {name} ({total_size} bytes)")]
    RangeNotSatisfiable {
        /// Requested filename
        name: String,
        /// Size of the file the range was resolved against
        total_size: u64,
    },

    /// Opening or seeking the file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl IntoResponse for FileServeError {
    fn into_response(self) -> Response {
        match self {
            FileServeError::NotFound { .. } => {
                (StatusCode::NOT_FOUND, "File not found").into_response()
            }
            FileServeError::RangeNotSatisfiable { .. } => (
                StatusCode::RANGE_NOT_SATISFIABLE,
                "Requested Range Not Satisfiable",
            )
                .into_response(),
            FileServeError::Io(error) => {
                warn!("file streaming setup failed: {error}");
                StatusCode::INTERNAL_SERVER_ERROR.into_response()
            }
        }
    }
}

/// `GET /files/{filename}` — paced, range-aware file download.
///
/// Pass `no_content_length=true` to drop the Content-Length header and
/// force chunked delivery, for clients that must handle bodies of
/// undeclared length.
///
/// # Errors
///
/// - `FileServeError::NotFound` - Unknown file (404)
/// - `FileServeError::RangeNotSatisfiable` - Empty resolved range (416)
/// - `FileServeError::Io` - Open/seek failures (500)
pub async fn serve_file(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
    uri: Uri,
    headers: HeaderMap,
) -> Result<Response, FileServeError> {
    let config = &state.config.files;
    let path = config.root_dir.join(&filename);

    let metadata = match tokio::fs::metadata(&path).await {
        Ok(metadata) if metadata.is_file() => metadata,
        _ => return Err(FileServeError::NotFound { name: filename }),
    };
    let total_size = metadata.len();

    // A malformed Range header is silently ignored: the request falls back
    // to the full file with status 200.
    let range_spec = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .and_then(range::parse_range_header);
    let is_partial = range_spec.is_some();
    let resolved = match range_spec {
        Some(spec) => spec
            .resolve(total_size)
            .map_err(|_| FileServeError::RangeNotSatisfiable {
                name: filename.clone(),
                total_size,
            })?,
        None => ResolvedRange::full(total_size),
    };

    let target_duration = config.delay_for(&filename);
    let plan = ChunkPlan::new(resolved.length, config.chunk_size, target_duration);
    info!(
        "serving {filename}: {} bytes from offset {} in {} chunks ({:?} per chunk)",
        resolved.length, resolved.start, plan.num_chunks, plan.delay_per_chunk
    );

    let mut file = File::open(&path).await?;
    file.seek(SeekFrom::Start(resolved.start)).await?;

    let mut response = Response::new(Body::from_stream(paced_chunks(file, resolved.length, plan)));
    if is_partial {
        *response.status_mut() = StatusCode::PARTIAL_CONTENT;
    }
    let response_headers = response.headers_mut();
    response_headers.insert(header::ACCEPT_RANGES, HeaderValue::from_static("bytes"));
    response_headers.insert(header::CONTENT_TYPE, content_type_for(&filename));
    if let Some(value) = etag_value(&metadata) {
        response_headers.insert(header::ETAG, value);
    }
    if let Some(value) = last_modified_value(&metadata) {
        response_headers.insert(header::LAST_MODIFIED, value);
    }
    if let Ok(value) = HeaderValue::try_from(format!("attachment; filename={filename}")) {
        response_headers.insert(header::CONTENT_DISPOSITION, value);
    }

    let omit_length = query_value(&uri, "no_content_length").as_deref() == Some("true");
    if omit_length {
        debug!("omitting Content-Length for {filename}");
    } else {
        response_headers.insert(header::CONTENT_LENGTH, HeaderValue::from(resolved.length));
    }

    if is_partial {
        let content_range = format!("bytes {}-{}/{total_size}", resolved.start, resolved.end());
        if let Ok(value) = HeaderValue::try_from(content_range) {
            response_headers.insert(header::CONTENT_RANGE, value);
        }
    }

    Ok(response)
}

struct ChunkState {
    file: File,
    remaining: u64,
    plan: ChunkPlan,
    started: bool,
}

/// Lazy chunk producer: read up to one chunk, yield it, and sleep the
/// plan's delay before the next read (and once more after the last chunk,
/// so the total transfer time tracks the target duration). Dropping the
/// stream — hyper does this when the client disconnects — closes the file
/// and stops the read/sleep loop.
fn paced_chunks(
    file: File,
    length: u64,
    plan: ChunkPlan,
) -> impl Stream<Item = std::io::Result<Bytes>> {
    let state = ChunkState {
        file,
        remaining: length,
        plan,
        started: false,
    };
    stream::try_unfold(state, |mut state| async move {
        if state.started && state.plan.is_paced() {
            tokio::time::sleep(state.plan.delay_per_chunk).await;
        }
        if state.remaining == 0 {
            return Ok(None);
        }

        let read_len = state.plan.chunk_size.min(state.remaining) as usize;
        let mut buf = vec![0u8; read_len];
        let read = state.file.read(&mut buf).await?;
        if read == 0 {
            // Source exhausted before the requested count was delivered.
            debug!("file ended {} bytes early", state.remaining);
            return Ok(None);
        }
        buf.truncate(read);
        state.remaining -= read as u64;
        state.started = true;
        Ok(Some((Bytes::from(buf), state)))
    })
}

fn content_type_for(filename: &str) -> HeaderValue {
    if filename.to_ascii_lowercase().ends_with(".zip") {
        HeaderValue::from_static("application/zip")
    } else {
        HeaderValue::from_static("application/octet-stream")
    }
}

// Weak identity from (mtime, size), enough for cache-validation tests.
fn etag_value(metadata: &std::fs::Metadata) -> Option<HeaderValue> {
    let mtime = metadata.modified().ok()?;
    let unix = mtime.duration_since(UNIX_EPOCH).ok()?.as_secs();
    HeaderValue::try_from(format!("\"{unix}-{}\"", metadata.len())).ok()
}

fn last_modified_value(metadata: &std::fs::Metadata) -> Option<HeaderValue> {
    let mtime: DateTime<Utc> = metadata.modified().ok()?.into();
    HeaderValue::try_from(mtime.format("%a, %d %b %Y %H:%M:%S GMT").to_string()).ok()
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, Instant};

    use futures::TryStreamExt;

    use super::*;

    async fn collect(stream: impl Stream<Item = std::io::Result<Bytes>>) -> Vec<u8> {
        let chunks: Vec<Bytes> = stream.try_collect().await.expect("stream chunks");
        chunks.concat()
    }

    fn scratch_file(contents: &[u8]) -> (tempfile::TempDir, std::path::PathBuf) {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("data.bin");
        std::fs::write(&path, contents).expect("write scratch file");
        (dir, path)
    }

    #[test]
    fn test_content_type_for_zip_is_case_insensitive() {
        assert_eq!(content_type_for("a.zip"), "application/zip");
        assert_eq!(content_type_for("A.ZIP"), "application/zip");
        assert_eq!(content_type_for("a.bin"), "application/octet-stream");
    }

    #[test]
    fn test_etag_shape() {
        let (_dir, path) = scratch_file(b"0123456789");
        let metadata = std::fs::metadata(&path).unwrap();
        let etag = etag_value(&metadata).unwrap();
        let text = etag.to_str().unwrap();
        assert!(text.starts_with('"') && text.ends_with('"'));
        assert!(text.trim_matches('"').ends_with("-10"));
    }

    #[test]
    fn test_last_modified_is_http_date() {
        let (_dir, path) = scratch_file(b"x");
        let metadata = std::fs::metadata(&path).unwrap();
        let value = last_modified_value(&metadata).unwrap();
        let text = value.to_str().unwrap();
        assert!(text.ends_with(" GMT"));
        // e.g. "Wed, 05 Aug 2026 10:00:00 GMT"
        assert_eq!(text.len(), 29);
    }

    #[tokio::test]
    async fn test_paced_chunks_round_trip() {
        let payload: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        let (_dir, path) = scratch_file(&payload);

        let file = File::open(&path).await.unwrap();
        let plan = ChunkPlan::new(payload.len() as u64, 4096, Duration::ZERO);
        let collected = collect(paced_chunks(file, payload.len() as u64, plan)).await;
        assert_eq!(collected, payload);
    }

    #[tokio::test]
    async fn test_paced_chunks_honor_offset_and_length() {
        let payload: Vec<u8> = (0..50_000u32).map(|i| (i % 241) as u8).collect();
        let (_dir, path) = scratch_file(&payload);

        let mut file = File::open(&path).await.unwrap();
        file.seek(SeekFrom::Start(1000)).await.unwrap();
        let plan = ChunkPlan::new(2500, 1024, Duration::ZERO);
        let collected = collect(paced_chunks(file, 2500, plan)).await;
        assert_eq!(collected, &payload[1000..3500]);
    }

    #[tokio::test]
    async fn test_paced_chunks_sleep_between_chunks() {
        let payload = vec![7u8; 4096];
        let (_dir, path) = scratch_file(&payload);

        let file = File::open(&path).await.unwrap();
        let plan = ChunkPlan::new(4096, 1024, Duration::from_millis(200));
        let started = Instant::now();
        let collected = collect(paced_chunks(file, 4096, plan)).await;
        assert_eq!(collected.len(), 4096);
        assert!(started.elapsed() >= Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_zero_length_stream_ends_immediately() {
        let (_dir, path) = scratch_file(b"");
        let file = File::open(&path).await.unwrap();
        let plan = ChunkPlan::new(0, 1024, Duration::from_secs(5));
        let collected = collect(paced_chunks(file, 0, plan)).await;
        assert!(collected.is_empty());
    }
}

//! HTTP route for media streaming.
//!
//! Wires the storage seam and the range engine together:
//! `GET /videos/{key}/stream` resolves the key, validates the `Range`
//! header against the resource length, then either streams the span,
//! redirects to the object store, or maps the failure to its status code.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use tracing::{debug, error};

use crate::parse::{resolve, RangeRejection};
use crate::respond::PartialContent;
use crate::store::{MediaSource, MediaStore, StoreError};

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Video not found",
        }),
    )
        .into_response()
}

/// Build the streaming router over an injected media store.
pub fn router(store: Arc<dyn MediaStore>) -> Router {
    Router::new()
        .route("/videos/{key}/stream", get(stream_media))
        .with_state(store)
}

async fn stream_media(
    State(store): State<Arc<dyn MediaStore>>,
    Path(key): Path<String>,
    headers: HeaderMap,
) -> Response {
    let media = match store.resolve(&key).await {
        Ok(media) => media,
        Err(StoreError::NotFound { .. } | StoreError::Empty { .. }) => return not_found(),
        Err(e) => {
            error!(key = %key, error = %e, "media lookup failed");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    let local = match media {
        MediaSource::Redirect(url) => return Redirect::temporary(&url).into_response(),
        MediaSource::Local(local) => local,
    };

    let range = match headers.get(header::RANGE) {
        None => None,
        Some(value) => match value.to_str() {
            Ok(value) => Some(value),
            Err(_) => return RangeRejection::Malformed.into_response(),
        },
    };

    let span = match resolve(range, local.total_len()) {
        Ok(span) => span,
        Err(rejection) => {
            debug!(key = %key, %rejection, "range rejected");
            return rejection.into_response();
        }
    };

    // the source is only opened once a span has been resolved; rejected
    // requests never touch storage
    match local.open().await {
        Ok(source) => PartialContent::new(span, source, local.content_type()).into_response(),
        Err(e) => {
            // vanished between resolve and open; headers are not out yet so
            // a plain 500 is still possible
            error!(key = %key, start = span.start, end = span.end, error = %e, "opening media source failed");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::body::to_bytes;
    use tempfile::TempDir;

    use super::*;
    use crate::store::{FsMediaStore, RemoteMediaStore};

    const CLIP_LEN: usize = 5000;

    fn clip_bytes() -> Vec<u8> {
        (0..CLIP_LEN).map(|i| (i % 251) as u8).collect()
    }

    async fn fs_store() -> (Arc<dyn MediaStore>, TempDir) {
        let dir = TempDir::new().unwrap();
        tokio::fs::write(dir.path().join("clip.mp4"), clip_bytes())
            .await
            .unwrap();
        (Arc::new(FsMediaStore::new(dir.path())), dir)
    }

    async fn request(store: Arc<dyn MediaStore>, key: &str, range: Option<&str>) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(range) = range {
            headers.insert(header::RANGE, range.parse().unwrap());
        }
        stream_media(State(store), Path(key.to_string()), headers).await
    }

    async fn body_bytes(response: Response) -> Vec<u8> {
        to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap()
            .to_vec()
    }

    #[tokio::test]
    async fn serves_partial_content() {
        let (store, _dir) = fs_store().await;
        let response = request(store, "clip.mp4", Some("bytes=1000-1999")).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 1000-1999/5000"
        );
        assert_eq!(
            response.headers().get(header::ACCEPT_RANGES).unwrap(),
            "bytes"
        );
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "video/mp4"
        );

        let body = body_bytes(response).await;
        assert_eq!(body, &clip_bytes()[1000..2000]);
    }

    #[tokio::test]
    async fn serves_open_ended_range_to_file_end() {
        let (store, _dir) = fs_store().await;
        let response = request(store, "clip.mp4", Some("bytes=4000-")).await;

        assert_eq!(response.status(), StatusCode::PARTIAL_CONTENT);
        assert_eq!(
            response.headers().get(header::CONTENT_RANGE).unwrap(),
            "bytes 4000-4999/5000"
        );
        assert_eq!(body_bytes(response).await, &clip_bytes()[4000..]);
    }

    #[tokio::test]
    async fn missing_range_is_400() {
        let (store, _dir) = fs_store().await;
        let response = request(store, "clip.mp4", None).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_bytes(response).await, b"Range header is required");
    }

    #[tokio::test]
    async fn malformed_range_is_400() {
        let (store, _dir) = fs_store().await;
        let response = request(store, "clip.mp4", Some("0-500")).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_bytes(response).await, b"Invalid Range header format");
    }

    #[tokio::test]
    async fn out_of_bounds_range_is_416() {
        let (store, _dir) = fs_store().await;
        let response = request(store, "clip.mp4", Some("bytes=5000-5000")).await;

        assert_eq!(response.status(), StatusCode::RANGE_NOT_SATISFIABLE);
        let body = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(body.contains("5000-5000/5000"), "body was: {body}");
    }

    #[tokio::test]
    async fn unknown_key_is_404_json() {
        let (store, _dir) = fs_store().await;
        let response = request(store, "missing.mp4", Some("bytes=0-")).await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_bytes(response).await, br#"{"error":"Video not found"}"#);
    }

    #[tokio::test]
    async fn remote_store_redirects() {
        let store: Arc<dyn MediaStore> =
            Arc::new(RemoteMediaStore::new("http://localhost:9000", "videos"));
        let response = request(store, "clip.mp4", Some("bytes=0-")).await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            "http://localhost:9000/videos/clip.mp4"
        );
    }

    #[tokio::test]
    async fn repeated_requests_are_byte_identical() {
        let (store, _dir) = fs_store().await;

        let a = request(store.clone(), "clip.mp4", Some("bytes=0-99")).await;
        let b = request(store, "clip.mp4", Some("bytes=0-99")).await;

        assert_eq!(a.status(), b.status());
        assert_eq!(
            a.headers().get(header::CONTENT_RANGE),
            b.headers().get(header::CONTENT_RANGE)
        );
        assert_eq!(
            a.headers().get(header::CONTENT_LENGTH),
            b.headers().get(header::CONTENT_LENGTH)
        );
        assert_eq!(body_bytes(a).await, body_bytes(b).await);
    }
}

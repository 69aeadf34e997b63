//! Partial-content response construction.
//!
//! Maps a resolved [`ByteSpan`] to a `206 Partial Content` response and a
//! [`RangeRejection`] to its `400`/`416` counterpart. Rejections never touch
//! a byte source; only a resolved span gets a body stream.

use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::parse::{ByteSpan, RangeRejection};
use crate::stream::RangeStream;
use crate::RangeSource;

/// A computed `206 Partial Content` response. Implements [`IntoResponse`].
///
/// Writes `Content-Range`, `Accept-Ranges`, `Content-Length` and
/// `Content-Type`, then streams exactly the bytes of the span.
pub struct PartialContent<S> {
    span: ByteSpan,
    total_len: u64,
    content_type: String,
    stream: RangeStream<S>,
}

impl<S: RangeSource> PartialContent<S> {
    /// Build the response for a span already validated against the source's
    /// total length.
    pub fn new(span: ByteSpan, source: S, content_type: impl Into<String>) -> Self {
        let total_len = source.total_len();
        let stream = RangeStream::new(source, span.start, span.len());
        PartialContent {
            span,
            total_len,
            content_type: content_type.into(),
            stream,
        }
    }

    /// The `Content-Range` header value, `bytes {start}-{end}/{total}`.
    pub fn content_range(&self) -> String {
        format!(
            "bytes {}-{}/{}",
            self.span.start, self.span.end, self.total_len
        )
    }
}

impl<S: RangeSource + Send + 'static> IntoResponse for PartialContent<S> {
    fn into_response(self) -> Response {
        let content_range = HeaderValue::from_str(&self.content_range())
            .expect("numeric Content-Range is always a valid header value");
        let content_length = HeaderValue::from(self.span.len());
        let content_type = HeaderValue::from_str(&self.content_type)
            .unwrap_or_else(|_| HeaderValue::from_static("application/octet-stream"));

        let headers = [
            ("Accept-Ranges", HeaderValue::from_static("bytes")),
            ("Content-Range", content_range),
            ("Content-Length", content_length),
            ("Content-Type", content_type),
        ];

        (StatusCode::PARTIAL_CONTENT, headers, self.stream).into_response()
    }
}

impl IntoResponse for RangeRejection {
    fn into_response(self) -> Response {
        let status = match self {
            RangeRejection::MissingHeader | RangeRejection::Malformed => StatusCode::BAD_REQUEST,
            RangeRejection::Unsatisfiable { .. } => StatusCode::RANGE_NOT_SATISFIABLE,
        };

        (status, self.to_string()).into_response()
    }
}

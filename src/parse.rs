//! `Range` header resolution.
//!
//! Pure parsing and validation of a raw `Range` header value against a known
//! resource length. No I/O happens here; the caller supplies the
//! authoritative total length and acts on the outcome.

use thiserror::Error;

/// Cap applied to open-ended ranges (`bytes=N-`), in bytes.
///
/// Bounding unbounded requests to a fixed-size chunk lets clients buffer
/// progressively instead of receiving the whole remaining file in one
/// response.
pub const DEFAULT_CHUNK: u64 = 1_000_000;

/// A resolved, validated byte interval, inclusive on both ends.
///
/// Invariant: `start <= end < total_len` for the length it was resolved
/// against. Constructed per-request by [`resolve`] and discarded once the
/// response is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteSpan {
    pub start: u64,
    pub end: u64,
}

impl ByteSpan {
    /// Number of bytes covered by the span. Always at least 1.
    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// A resolved span always covers at least one byte.
    pub fn is_empty(&self) -> bool {
        false
    }
}

/// Why a `Range` header did not resolve to a serveable span.
///
/// The `Display` text of each variant is the response body the client sees,
/// so the wording is part of the wire contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeRejection {
    /// No `Range` header at all. This server only serves ranged requests and
    /// does not fall back to whole-file responses.
    #[error("Range header is required")]
    MissingHeader,

    /// Anything that is not `bytes=<int>-[<int>]`, including suffix ranges
    /// (`bytes=-500`), multi-range sets (`bytes=0-1,5-9`) and inverted
    /// in-bounds ranges (`bytes=10-5`).
    #[error("Invalid Range header format")]
    Malformed,

    /// Syntactically valid but outside the resource. Carries the numbers the
    /// client needs to re-request correctly.
    #[error("Request range not satisfiable: {start}-{end}/{total_len}")]
    Unsatisfiable {
        start: u64,
        end: u64,
        total_len: u64,
    },
}

/// Resolve a raw `Range` header value against a resource of `total_len` bytes.
///
/// Accepts the single contiguous form `bytes=<start>-[<end>]`, inclusive on
/// both ends. An open-ended range is capped at [`DEFAULT_CHUNK`] bytes or the
/// end of the resource, whichever comes first.
///
/// `total_len` must be at least 1; callers map empty or missing resources to
/// not-found before range resolution runs.
///
/// # Errors
/// - [`RangeRejection::MissingHeader`] - `header` is `None`
/// - [`RangeRejection::Malformed`] - not parseable as a single `bytes=` range
/// - [`RangeRejection::Unsatisfiable`] - start or end outside the resource
pub fn resolve(header: Option<&str>, total_len: u64) -> Result<ByteSpan, RangeRejection> {
    debug_assert!(total_len > 0, "zero-length resources are filtered out upstream");

    let header = header.ok_or(RangeRejection::MissingHeader)?;

    let spec = header
        .strip_prefix("bytes=")
        .ok_or(RangeRejection::Malformed)?;

    // split on the first '-' only: a second '-' or a ',' ends up inside the
    // end token and fails numeric parsing below, so multi-range sets are
    // rejected instead of silently serving their first sub-range
    let (start_token, end_token) = spec.split_once('-').ok_or(RangeRejection::Malformed)?;

    let start: u64 = start_token.parse().map_err(|_| RangeRejection::Malformed)?;

    let end: u64 = if end_token.is_empty() {
        // open-ended: serve one chunk, not the whole remaining file
        start
            .saturating_add(DEFAULT_CHUNK - 1)
            .min(total_len.saturating_sub(1))
    } else {
        end_token.parse().map_err(|_| RangeRejection::Malformed)?
    };

    if start >= total_len || end >= total_len {
        return Err(RangeRejection::Unsatisfiable {
            start,
            end,
            total_len,
        });
    }

    // in bounds but inverted, e.g. bytes=10-5
    if end < start {
        return Err(RangeRejection::Malformed);
    }

    Ok(ByteSpan { start, end })
}

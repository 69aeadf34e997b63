//! Bounded body stream for partial-content responses.
//!
//! [`RangeStream`] seeks the source to the span start, then copies bytes to
//! the transport one buffer at a time. Backpressure from the client reaches
//! the read loop through `poll_next`, so memory per transfer stays at one
//! I/O buffer no matter how large the span is.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::{io, mem};

use axum::response::{IntoResponse, Response};
use bytes::{Bytes, BytesMut};
use futures::Stream;
use http_body::{Body, Frame, SizeHint};
use pin_project::pin_project;
use tokio::io::ReadBuf;

use crate::RangeSource;

const IO_BUFFER_SIZE: usize = 64 * 1024;

/// Response body yielding exactly `len` bytes of the source starting at
/// `start`. Implements [`Stream`], [`Body`], and [`IntoResponse`].
///
/// The stream exclusively owns its source; dropping the stream (client
/// disconnect included) releases the underlying handle.
#[pin_project]
pub struct RangeStream<S> {
    state: TransferState,
    len: u64,
    #[pin]
    source: S,
}

impl<S: RangeSource> RangeStream<S> {
    pub(crate) fn new(source: S, start: u64, len: u64) -> Self {
        RangeStream {
            state: TransferState::Seek { start },
            len,
            source,
        }
    }
}

#[derive(Debug)]
enum TransferState {
    Seek { start: u64 },
    Seeking { remaining: u64 },
    Reading { buffer: BytesMut, remaining: u64 },
}

impl<S: RangeSource + Send + 'static> IntoResponse for RangeStream<S> {
    fn into_response(self) -> Response {
        Response::new(axum::body::Body::new(self))
    }
}

impl<S: RangeSource> Body for RangeStream<S> {
    type Data = Bytes;
    type Error = io::Error;

    fn size_hint(&self) -> SizeHint {
        SizeHint::with_exact(self.len)
    }

    fn poll_frame(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
    ) -> Poll<Option<io::Result<Frame<Bytes>>>> {
        self.poll_next(cx)
            .map(|item| item.map(|result| result.map(Frame::data)))
    }
}

impl<S: RangeSource> Stream for RangeStream<S> {
    type Item = io::Result<Bytes>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<io::Result<Bytes>>> {
        let mut this = self.project();

        if let TransferState::Seek { start } = *this.state {
            match this.source.as_mut().start_seek(start) {
                Err(e) => return Poll::Ready(Some(Err(fail(e, "seek")))),
                Ok(()) => {
                    let remaining = *this.len;
                    *this.state = TransferState::Seeking { remaining };
                }
            }
        }

        if let TransferState::Seeking { remaining } = *this.state {
            match this.source.as_mut().poll_complete(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(fail(e, "seek")))),
                Poll::Ready(Ok(())) => {
                    let buffer = allocate_buffer();
                    *this.state = TransferState::Reading { buffer, remaining };
                }
            }
        }

        if let TransferState::Reading { buffer, remaining } = this.state {
            let uninit = buffer.spare_capacity_mut();

            // read no further than the span end, even if the source has more
            let nbytes = std::cmp::min(
                uninit.len(),
                usize::try_from(*remaining).unwrap_or(usize::MAX),
            );

            let mut read_buf = ReadBuf::uninit(&mut uninit[0..nbytes]);

            match this.source.as_mut().poll_read(cx, &mut read_buf) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(Err(e)) => return Poll::Ready(Some(Err(fail(e, "read")))),
                Poll::Ready(Ok(())) => {
                    match read_buf.filled().len() {
                        0 => return Poll::Ready(None),
                        n => {
                            // SAFETY: poll_read filled `n` additional bytes.
                            // `buffer.len` is always 0 here, but include it
                            // for rigorous correctness
                            unsafe { buffer.set_len(buffer.len() + n) };

                            let chunk = mem::replace(buffer, allocate_buffer());

                            // n <= remaining by the cmp::min above, so the
                            // usize->u64 conversion cannot fail
                            *remaining -= u64::try_from(n).unwrap();

                            return Poll::Ready(Some(Ok(chunk.freeze())));
                        }
                    }
                }
            }
        }

        unreachable!();
    }
}

/// A fault after headers have gone out is terminal for the response: log it
/// and let the transport tear the stream down. Retrying is the client's job.
fn fail(e: io::Error, op: &'static str) -> io::Error {
    tracing::error!(error = %e, op, "range transfer aborted");
    e
}

fn allocate_buffer() -> BytesMut {
    BytesMut::with_capacity(IO_BUFFER_SIZE)
}

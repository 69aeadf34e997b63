//! Byte-source adapter carrying a fixed total length.

use std::io;
use std::path::Path;
use std::pin::Pin;
use std::task::{Context, Poll};

use pin_project::pin_project;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncSeek, AsyncSeekExt, ReadBuf};

use crate::{AsyncSeekStart, RangeSource};

/// Implements [`RangeSource`] for any [`AsyncRead`] + [`AsyncSeekStart`],
/// constructed with a fixed byte size.
///
/// The recorded size is authoritative for the lifetime of the value; it is
/// never re-read from the underlying reader, so a file growing or shrinking
/// mid-request cannot skew range math for the response in flight.
#[pin_project]
pub struct SizedSource<S> {
    total_len: u64,
    #[pin]
    inner: S,
}

impl SizedSource<File> {
    /// Open `path` and record its current metadata length.
    pub async fn open(path: impl AsRef<Path>) -> io::Result<SizedSource<File>> {
        let file = File::open(path).await?;
        SizedSource::file(file).await
    }

    /// Calls [`File::metadata`] to determine the size of an already-open file.
    pub async fn file(file: File) -> io::Result<SizedSource<File>> {
        let total_len = file.metadata().await?.len();
        Ok(SizedSource { total_len, inner: file })
    }
}

impl<S: AsyncRead + AsyncSeekStart> SizedSource<S> {
    /// Construct a [`SizedSource`] with a byte size supplied by the caller.
    pub fn sized(inner: S, total_len: u64) -> Self {
        SizedSource { total_len, inner }
    }
}

impl<S: AsyncRead + AsyncSeek + Unpin> SizedSource<S> {
    /// Determine size by seeking to the end of the reader.
    pub async fn seek(mut inner: S) -> io::Result<SizedSource<S>> {
        let total_len = Pin::new(&mut inner).seek(io::SeekFrom::End(0)).await?;
        Ok(SizedSource { total_len, inner })
    }
}

impl<S: AsyncRead + AsyncSeekStart> AsyncRead for SizedSource<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        self.project().inner.poll_read(cx, buf)
    }
}

impl<S: AsyncRead + AsyncSeekStart> AsyncSeekStart for SizedSource<S> {
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()> {
        self.project().inner.start_seek(position)
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.project().inner.poll_complete(cx)
    }
}

impl<S: AsyncRead + AsyncSeekStart> RangeSource for SizedSource<S> {
    fn total_len(&self) -> u64 {
        self.total_len
    }
}

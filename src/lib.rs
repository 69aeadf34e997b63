//! # media-range
//!
//! HTTP range-request media streaming engine for [`axum`][1].
//!
//! Serves seekable, pausable, resumable byte-streams using the
//! `Range` / `Content-Range` / `Accept-Ranges` protocol, the way a
//! progressive-download video player consumes them. The engine is split in
//! two: [`resolve`] turns a raw `Range` header and a known resource length
//! into a validated [`ByteSpan`] (or a [`RangeRejection`]), and
//! [`PartialContent`] writes the `206` response, copying exactly the
//! requested span from any [`RangeSource`] with bounded memory.
//!
//! Any type implementing both [`AsyncRead`] and [`AsyncSeekStart`] can be
//! used through the [`SizedSource`] adapter. [`AsyncSeekStart`] only allows
//! seeking from the start of a resource and is automatically implemented for
//! any type implementing [`AsyncSeek`].
//!
//! Resources are looked up through the [`MediaStore`] seam: the filesystem
//! variant streams local files, the remote variant redirects the client to a
//! presigned object-store URL.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use media_range::{FsMediaStore, router};
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(FsMediaStore::new("./media"));
//!     let app = router(store);
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! [1]: https://docs.rs/axum

mod config;
mod handler;
mod parse;
mod respond;
mod source;
mod store;
mod stream;

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncSeek};

pub use config::{ConfigError, MediaConfig, StorageMode};
pub use handler::router;
pub use parse::{resolve, ByteSpan, RangeRejection, DEFAULT_CHUNK};
pub use respond::PartialContent;
pub use source::SizedSource;
pub use store::{FsMediaStore, LocalMedia, MediaSource, MediaStore, RemoteMediaStore, StoreError};
pub use stream::RangeStream;

/// [`AsyncSeek`] narrowed to only allow seeking from start.
pub trait AsyncSeekStart {
    /// Same semantics as [`AsyncSeek::start_seek`], always passing position as the `SeekFrom::Start` variant.
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()>;

    /// Same semantics as [`AsyncSeek::poll_complete`], returning `()` instead of the new stream position.
    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>>;
}

impl<T: AsyncSeek> AsyncSeekStart for T {
    fn start_seek(self: Pin<&mut Self>, position: u64) -> io::Result<()> {
        AsyncSeek::start_seek(self, io::SeekFrom::Start(position))
    }

    fn poll_complete(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        AsyncSeek::poll_complete(self, cx).map_ok(|_| ())
    }
}

/// An [`AsyncRead`] and [`AsyncSeekStart`] with a fixed known byte size.
pub trait RangeSource: AsyncRead + AsyncSeekStart {
    /// The total size of the underlying resource in bytes.
    ///
    /// This is authoritative for range resolution and must not change for
    /// the lifetime of the object once queried.
    fn total_len(&self) -> u64;
}

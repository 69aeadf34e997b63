//! Media storage backends.
//!
//! A [`MediaStore`] resolves an opaque media key to something streamable:
//! either a local file the range engine serves itself, or a remote object
//! URL the client is redirected to. Stores are read-only and safe for
//! concurrent use; every streaming request opens its own file handle.

use std::io;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use thiserror::Error;
use tokio::fs::File;
use tracing::debug;

use crate::source::SizedSource;

/// Errors surfaced while resolving a media key.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No media behind the key, or the key is not a safe relative path.
    #[error("media not found: {key}")]
    NotFound { key: String },

    /// The file exists but holds no bytes; nothing can be range-served from
    /// it, so it is reported before any range handling runs.
    #[error("media file is empty: {key}")]
    Empty { key: String },

    /// Underlying storage I/O failed.
    #[error("storage error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },
}

/// A locally streamable resource: its path, authoritative byte length and
/// media type, plus the capability to open an independent read handle.
#[derive(Debug, Clone)]
pub struct LocalMedia {
    path: PathBuf,
    total_len: u64,
    content_type: String,
}

impl LocalMedia {
    /// Total resource length in bytes, captured at resolve time. Range math
    /// is done against this value, never against a later stat of the file.
    pub fn total_len(&self) -> u64 {
        self.total_len
    }

    /// Media type guessed from the file name, e.g. `video/mp4`.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// Open a fresh positioned-read handle for one streaming session.
    ///
    /// Each caller gets its own handle, so concurrent requests for the same
    /// resource never share seek state.
    pub async fn open(&self) -> io::Result<SizedSource<File>> {
        let file = File::open(&self.path).await?;
        Ok(SizedSource::sized(file, self.total_len))
    }
}

/// Outcome of resolving a media key.
#[derive(Debug)]
pub enum MediaSource {
    /// Stream the bytes from local storage through the range engine.
    Local(LocalMedia),
    /// Send the client straight to an object-store URL.
    Redirect(String),
}

/// Resolves opaque media keys to streamable sources.
#[async_trait]
pub trait MediaStore: Send + Sync + std::fmt::Debug {
    /// Resolve `key` to a streamable source.
    ///
    /// # Errors
    /// - [`StoreError::NotFound`] - nothing behind the key
    /// - [`StoreError::Empty`] - zero-length media file
    /// - [`StoreError::Io`] - storage access failed
    async fn resolve(&self, key: &str) -> Result<MediaSource, StoreError>;
}

/// Filesystem-backed store serving files under a media root directory.
#[derive(Debug)]
pub struct FsMediaStore {
    root: PathBuf,
}

impl FsMediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsMediaStore { root: root.into() }
    }

    /// Keys are root-relative paths like `uploads/1699999_clip.mp4`. Parent
    /// and absolute components must not escape the media root.
    fn safe_path(&self, key: &str) -> Option<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.root.join(relative))
    }
}

#[async_trait]
impl MediaStore for FsMediaStore {
    async fn resolve(&self, key: &str) -> Result<MediaSource, StoreError> {
        let path = self.safe_path(key).ok_or_else(|| StoreError::NotFound {
            key: key.to_string(),
        })?;

        let metadata = match tokio::fs::metadata(&path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound {
                    key: key.to_string(),
                })
            }
            Err(e) => return Err(e.into()),
        };

        let total_len = metadata.len();
        if total_len == 0 {
            return Err(StoreError::Empty {
                key: key.to_string(),
            });
        }

        let content_type = mime_guess::from_path(&path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        debug!(key, total_len, content_type = %content_type, "resolved local media");

        Ok(MediaSource::Local(LocalMedia {
            path,
            total_len,
            content_type,
        }))
    }
}

/// Object-store-backed store that hands out redirect URLs instead of bytes.
///
/// The catalog stores object keys; clients fetch the object directly from
/// the bucket endpoint, so this process never proxies video traffic. URL
/// signing (expiry, credentials) is applied by the storage deployment in
/// front of the bucket.
#[derive(Debug)]
pub struct RemoteMediaStore {
    endpoint: String,
    bucket: String,
}

impl RemoteMediaStore {
    pub fn new(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        let endpoint = endpoint.into();
        RemoteMediaStore {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            bucket: bucket.into(),
        }
    }

    fn object_url(&self, key: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, key)
    }
}

#[async_trait]
impl MediaStore for RemoteMediaStore {
    async fn resolve(&self, key: &str) -> Result<MediaSource, StoreError> {
        if key.is_empty() {
            return Err(StoreError::NotFound {
                key: key.to_string(),
            });
        }

        let url = self.object_url(key);
        debug!(key, url = %url, "redirecting to object store");
        Ok(MediaSource::Redirect(url))
    }
}

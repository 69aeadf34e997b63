//! Deployment configuration for the streaming engine.
//!
//! Reads the same environment variables the surrounding application uses
//! and builds the [`MediaStore`] that gets injected into the router. The
//! engine itself never reads ambient state; everything flows through the
//! constructed store.

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::store::{FsMediaStore, MediaStore, RemoteMediaStore};

/// Where media bytes live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StorageMode {
    /// Files under a local media directory, streamed by this process.
    #[default]
    Filesystem,
    /// Objects in a bucket; clients are redirected to presigned URLs.
    Remote,
}

/// Configuration errors raised while assembling a store.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Remote mode needs both an endpoint and a bucket name.
    #[error("{name} must be set when VIDEO_STORAGE_MODE=minio")]
    MissingVar { name: &'static str },
}

/// Streaming storage configuration.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub mode: StorageMode,
    /// Root directory for filesystem mode.
    pub media_root: PathBuf,
    /// Object-store endpoint for remote mode, e.g. `http://localhost:9000`.
    pub remote_endpoint: Option<String>,
    /// Bucket name for remote mode.
    pub remote_bucket: Option<String>,
}

impl Default for MediaConfig {
    fn default() -> Self {
        MediaConfig {
            mode: StorageMode::Filesystem,
            media_root: PathBuf::from("./media"),
            remote_endpoint: None,
            remote_bucket: None,
        }
    }
}

impl MediaConfig {
    /// Read configuration from the process environment.
    ///
    /// `VIDEO_STORAGE_MODE=minio` selects remote mode; anything else (or
    /// nothing) selects filesystem mode rooted at `MEDIA_DIRECTORY`
    /// (default `./media`). Remote mode reads `MINIO_ENDPOINT` and
    /// `MINIO_BUCKET_NAME`.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mode = match lookup("VIDEO_STORAGE_MODE").as_deref() {
            Some("minio") => StorageMode::Remote,
            _ => StorageMode::Filesystem,
        };

        MediaConfig {
            mode,
            media_root: lookup("MEDIA_DIRECTORY")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./media")),
            remote_endpoint: lookup("MINIO_ENDPOINT"),
            remote_bucket: lookup("MINIO_BUCKET_NAME"),
        }
    }

    /// Build the media store this configuration describes.
    ///
    /// # Errors
    /// - [`ConfigError::MissingVar`] - remote mode without endpoint or bucket
    pub fn build_store(&self) -> Result<Arc<dyn MediaStore>, ConfigError> {
        match self.mode {
            StorageMode::Filesystem => Ok(Arc::new(FsMediaStore::new(self.media_root.clone()))),
            StorageMode::Remote => {
                let endpoint = self
                    .remote_endpoint
                    .as_deref()
                    .ok_or(ConfigError::MissingVar {
                        name: "MINIO_ENDPOINT",
                    })?;
                let bucket = self
                    .remote_bucket
                    .as_deref()
                    .ok_or(ConfigError::MissingVar {
                        name: "MINIO_BUCKET_NAME",
                    })?;
                Ok(Arc::new(RemoteMediaStore::new(endpoint, bucket)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn lookup_from<'a>(pairs: &'a [(&'a str, &'a str)]) -> impl Fn(&str) -> Option<String> + 'a {
        move |name| {
            pairs
                .iter()
                .find(|(k, _)| *k == name)
                .map(|(_, v)| v.to_string())
        }
    }

    #[test]
    fn defaults_to_filesystem_under_media() {
        let config = MediaConfig::from_lookup(|_| None);
        assert_eq!(config.mode, StorageMode::Filesystem);
        assert_eq!(config.media_root, PathBuf::from("./media"));
        assert!(config.build_store().is_ok());
    }

    #[test]
    fn reads_filesystem_root_override() {
        let config =
            MediaConfig::from_lookup(lookup_from(&[("MEDIA_DIRECTORY", "/srv/media")]));
        assert_eq!(config.media_root, PathBuf::from("/srv/media"));
    }

    #[test]
    fn minio_mode_selects_remote() {
        let config = MediaConfig::from_lookup(lookup_from(&[
            ("VIDEO_STORAGE_MODE", "minio"),
            ("MINIO_ENDPOINT", "http://localhost:9000"),
            ("MINIO_BUCKET_NAME", "videos"),
        ]));
        assert_eq!(config.mode, StorageMode::Remote);
        assert!(config.build_store().is_ok());
    }

    #[test]
    fn remote_mode_requires_endpoint_and_bucket() {
        let config =
            MediaConfig::from_lookup(lookup_from(&[("VIDEO_STORAGE_MODE", "minio")]));
        assert_matches!(
            config.build_store(),
            Err(ConfigError::MissingVar { name: "MINIO_ENDPOINT" })
        );

        let config = MediaConfig::from_lookup(lookup_from(&[
            ("VIDEO_STORAGE_MODE", "minio"),
            ("MINIO_ENDPOINT", "http://localhost:9000"),
        ]));
        assert_matches!(
            config.build_store(),
            Err(ConfigError::MissingVar { name: "MINIO_BUCKET_NAME" })
        );
    }

    #[test]
    fn unknown_mode_falls_back_to_filesystem() {
        let config =
            MediaConfig::from_lookup(lookup_from(&[("VIDEO_STORAGE_MODE", "carrier-pigeon")]));
        assert_eq!(config.mode, StorageMode::Filesystem);
    }
}

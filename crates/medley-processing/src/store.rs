//! Storage writer.
//!
//! Stream-copies an approved upload to its allocated path. Performs no
//! validation: by the time this runs the validator has already accepted the
//! file and allocated a unique destination, so overwrite-in-place is safe.

use std::path::Path;

use thiserror::Error;
use tokio::fs;

use crate::source::UploadSource;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Cannot open uploaded file: {0}")]
    OpenSource(#[source] std::io::Error),

    #[error("Failed to create file {path}: {source}")]
    CreateDestination {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Writes primary artifacts to the local filesystem.
#[derive(Clone, Debug, Default)]
pub struct StorageWriter;

impl StorageWriter {
    pub fn new() -> Self {
        Self
    }

    /// Copy the full payload of `source` to `dest`. The parent directory
    /// must already exist (the path allocator created it).
    pub async fn write(&self, source: &dyn UploadSource, dest: &Path) -> Result<u64, StoreError> {
        let start = std::time::Instant::now();

        let mut reader = source.open().await.map_err(StoreError::OpenSource)?;

        let mut file = fs::File::create(dest)
            .await
            .map_err(|source| StoreError::CreateDestination {
                path: dest.display().to_string(),
                source,
            })?;

        let bytes_copied = tokio::io::copy(&mut reader, &mut file)
            .await
            .map_err(|source| StoreError::Write {
                path: dest.display().to_string(),
                source,
            })?;

        file.sync_all().await.map_err(|source| StoreError::Write {
            path: dest.display().to_string(),
            source,
        })?;

        tracing::info!(
            path = %dest.display(),
            size_bytes = bytes_copied,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Stored primary artifact"
        );

        Ok(bytes_copied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MemoryUpload;
    use tempfile::tempdir;

    #[tokio::test]
    async fn writes_full_payload() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("photo_0123456789ab.png");
        let upload = MemoryUpload::new("photo.png", &b"fake image bytes"[..]);

        let written = StorageWriter::new().write(&upload, &dest).await.unwrap();

        assert_eq!(written, 16);
        assert_eq!(fs::read(&dest).await.unwrap(), b"fake image bytes");
    }

    #[tokio::test]
    async fn missing_parent_directory_is_an_error() {
        let dir = tempdir().unwrap();
        let dest = dir.path().join("nope").join("file.bin");
        let upload = MemoryUpload::new("file.bin", &b"x"[..]);

        let result = StorageWriter::new().write(&upload, &dest).await;
        assert!(matches!(result, Err(StoreError::CreateDestination { .. })));
    }
}

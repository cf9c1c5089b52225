//! Upload input abstraction.
//!
//! The HTTP layer hands the pipeline a sequence of upload sources; each one
//! can be reopened, so the validator may read a sniffing prefix and the
//! storage writer can later stream the full payload from the start.

use std::io;
use std::pin::Pin;

use async_trait::async_trait;
use bytes::Bytes;
use tokio::io::AsyncRead;

/// Readable handle over an uploaded payload.
pub type UploadReader = Pin<Box<dyn AsyncRead + Send + Unpin>>;

/// One uploaded file as supplied by the caller. Immutable for the duration
/// of a pipeline invocation.
#[async_trait]
pub trait UploadSource: Send + Sync {
    /// Client-declared filename. Used for diagnostics and to derive the
    /// unique name, never trusted for classification.
    fn original_name(&self) -> &str;

    /// Client-declared size in bytes, checked against policy before any
    /// byte is read.
    fn declared_size(&self) -> u64;

    /// Open a fresh reader positioned at the start of the payload.
    async fn open(&self) -> io::Result<UploadReader>;
}

/// In-memory upload, the common case for multipart bodies already buffered
/// by the HTTP layer.
#[derive(Clone, Debug)]
pub struct MemoryUpload {
    original_name: String,
    data: Bytes,
}

impl MemoryUpload {
    pub fn new(original_name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            original_name: original_name.into(),
            data: data.into(),
        }
    }
}

#[async_trait]
impl UploadSource for MemoryUpload {
    fn original_name(&self) -> &str {
        &self.original_name
    }

    fn declared_size(&self) -> u64 {
        self.data.len() as u64
    }

    async fn open(&self) -> io::Result<UploadReader> {
        Ok(Box::pin(std::io::Cursor::new(self.data.clone())))
    }
}

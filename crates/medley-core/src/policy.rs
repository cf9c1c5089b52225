//! Upload policy configuration
//!
//! An explicit configuration value passed into the validator and pipeline at
//! construction. Multiple policies can coexist in one process, which keeps
//! the pipeline testable.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

// Defaults applied when the corresponding environment variable is unset.
const MAX_FILE_SIZE_BYTES: u64 = 520 * 1024 * 1024;
const COMPRESS_MAX_DIMENSION: u32 = 2000;
const COMPRESS_QUALITY: u8 = 85;
const TOOL_TIMEOUT_SECS: u64 = 30;

/// Policy limits and storage settings for one ingestion pipeline.
#[derive(Clone, Debug)]
pub struct UploadPolicy {
    /// Uploads declaring a larger size are rejected before any byte is read.
    pub max_file_size_bytes: u64,
    /// Sniffed MIME types accepted by the validator.
    pub allowed_mime_types: Vec<String>,
    /// Root directory under which date-partitioned artifacts are written.
    pub storage_root: PathBuf,
    /// Re-encode oversized images in place before thumbnailing.
    pub compress_images: bool,
    /// Images whose width or height exceeds this are compressed.
    pub compress_max_dimension: u32,
    /// JPEG quality used when compressing (0-100).
    pub compress_quality: u8,
    /// Batch-level cap on files per call; `None` means unlimited.
    pub max_files_per_batch: Option<usize>,
    /// Bound on each external ffmpeg/ffprobe invocation.
    pub tool_timeout: Duration,
}

impl UploadPolicy {
    pub fn new(storage_root: impl Into<PathBuf>, allowed_mime_types: Vec<String>) -> Self {
        Self {
            max_file_size_bytes: MAX_FILE_SIZE_BYTES,
            allowed_mime_types,
            storage_root: storage_root.into(),
            compress_images: false,
            compress_max_dimension: COMPRESS_MAX_DIMENSION,
            compress_quality: COMPRESS_QUALITY,
            max_files_per_batch: None,
            tool_timeout: Duration::from_secs(TOOL_TIMEOUT_SECS),
        }
    }

    pub fn is_mime_allowed(&self, mime_type: &str) -> bool {
        let normalized = mime_type.to_lowercase();
        self.allowed_mime_types.iter().any(|m| *m == normalized)
    }

    /// Load policy from `MEDLEY_*` environment variables.
    pub fn from_env() -> Result<Self, anyhow::Error> {
        let storage_root = env::var("MEDLEY_STORAGE_ROOT")
            .map_err(|_| anyhow::anyhow!("MEDLEY_STORAGE_ROOT must be set"))?;

        let allowed_mime_types = env::var("MEDLEY_ALLOWED_MIME_TYPES")
            .unwrap_or_else(|_| {
                "image/jpeg,image/png,image/gif,image/webp,video/mp4,video/webm,audio/mpeg,application/pdf"
                    .to_string()
            })
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Ok(Self {
            max_file_size_bytes: env::var("MEDLEY_MAX_FILE_SIZE_BYTES")
                .unwrap_or_else(|_| MAX_FILE_SIZE_BYTES.to_string())
                .parse()
                .unwrap_or(MAX_FILE_SIZE_BYTES),
            allowed_mime_types,
            storage_root: PathBuf::from(storage_root),
            compress_images: env::var("MEDLEY_COMPRESS_IMAGES")
                .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            compress_max_dimension: env::var("MEDLEY_COMPRESS_MAX_DIMENSION")
                .unwrap_or_else(|_| COMPRESS_MAX_DIMENSION.to_string())
                .parse()
                .unwrap_or(COMPRESS_MAX_DIMENSION),
            compress_quality: env::var("MEDLEY_COMPRESS_QUALITY")
                .unwrap_or_else(|_| COMPRESS_QUALITY.to_string())
                .parse()
                .unwrap_or(COMPRESS_QUALITY),
            max_files_per_batch: env::var("MEDLEY_MAX_FILES_PER_BATCH")
                .ok()
                .and_then(|v| v.parse().ok()),
            tool_timeout: Duration::from_secs(
                env::var("MEDLEY_TOOL_TIMEOUT_SECS")
                    .unwrap_or_else(|_| TOOL_TIMEOUT_SECS.to_string())
                    .parse()
                    .unwrap_or(TOOL_TIMEOUT_SECS),
            ),
        })
    }
}

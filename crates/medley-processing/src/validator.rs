//! Upload validation.
//!
//! Enforces size limits and the MIME allow-list before any storage write
//! occurs, then allocates the unique name and storage path. All validation
//! rules live here; the storage writer and processors assume an approved
//! descriptor.

use medley_core::{ProcessedFile, RejectedUpload, UploadPolicy, ValidationOutcome};
use thiserror::Error;
use tokio::io::AsyncReadExt;

use crate::naming;
use crate::sniff::{self, SNIFF_PREFIX_LEN};
use crate::source::UploadSource;

/// Per-file validation errors, surfaced to callers as human-readable strings.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("File too large. Max size: {max} bytes")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Cannot open file: {0}")]
    OpenFailed(#[source] std::io::Error),

    #[error("Cannot read file: {0}")]
    ReadFailed(#[source] std::io::Error),

    #[error("Unsupported file type: {0}")]
    DisallowedMimeType(String),

    #[error("Cannot generate storage path: {0}")]
    PathAllocation(#[from] naming::AllocError),
}

/// Validates one upload at a time against a fixed policy.
pub struct UploadValidator {
    policy: UploadPolicy,
}

impl UploadValidator {
    pub fn new(policy: UploadPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    /// Validate `source` for ingestion under `category`.
    ///
    /// On success the returned descriptor is fully populated except for the
    /// processor-owned fields (thumbnail, dimensions, duration); nothing has
    /// been written to storage yet. A path-allocation failure rejects the
    /// file outright.
    pub async fn validate(&self, source: &dyn UploadSource, category: &str) -> ValidationOutcome {
        match self.try_validate(source, category).await {
            Ok(file) => ValidationOutcome::Valid(file),
            Err(err) => {
                tracing::debug!(
                    original_name = source.original_name(),
                    error = %err,
                    "Upload rejected"
                );
                ValidationOutcome::Rejected(RejectedUpload {
                    original_name: source.original_name().to_string(),
                    errors: vec![err.to_string()],
                })
            }
        }
    }

    async fn try_validate(
        &self,
        source: &dyn UploadSource,
        category: &str,
    ) -> Result<ProcessedFile, ValidationError> {
        let declared_size = source.declared_size();
        if declared_size > self.policy.max_file_size_bytes {
            return Err(ValidationError::FileTooLarge {
                size: declared_size,
                max: self.policy.max_file_size_bytes,
            });
        }

        let reader = source.open().await.map_err(ValidationError::OpenFailed)?;
        let mut prefix = Vec::with_capacity(SNIFF_PREFIX_LEN);
        reader
            .take(SNIFF_PREFIX_LEN as u64)
            .read_to_end(&mut prefix)
            .await
            .map_err(ValidationError::ReadFailed)?;

        let sniffed = sniff::sniff_mime(&prefix);
        if !self.policy.is_mime_allowed(&sniffed.mime_type) {
            return Err(ValidationError::DisallowedMimeType(sniffed.mime_type));
        }

        let unique_name = naming::unique_file_name(source.original_name());
        let (storage_path, relative_path) = naming::allocate_storage_path(
            &self.policy.storage_root,
            category,
            sniffed.kind,
            &unique_name,
        )
        .await?;

        Ok(ProcessedFile {
            original_name: source.original_name().to_string(),
            unique_name,
            storage_path,
            relative_path,
            media_kind: sniffed.kind,
            mime_type: sniffed.mime_type,
            size_bytes: declared_size,
            thumbnail_path: None,
            thumbnail_name: None,
            width: None,
            height: None,
            duration_seconds: None,
        })
    }
}

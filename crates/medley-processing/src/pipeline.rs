//! Batch ingestion pipeline: validate → store → process, per file.
//!
//! Files go through sequentially in input order. Every failure is localized
//! to its originating file and surfaced as a string message; the batch never
//! aborts part-way, and stored artifacts are not rolled back when later
//! processing of the same file fails. Callers distinguish "all succeeded",
//! "some succeeded" and "all failed" from the result list length versus the
//! presence of the aggregated error.

use std::sync::Arc;

use anyhow::Result;
use medley_core::{ProcessedFile, RejectedUpload, UploadPolicy, ValidationOutcome};
use tokio_util::sync::CancellationToken;

use crate::processors::MediaProcessors;
use crate::source::UploadSource;
use crate::store::StorageWriter;
use crate::tools::{FfmpegThumbnailer, FfprobeStreamProbe, StreamProbe, ThumbnailExtractor};
use crate::validator::UploadValidator;

/// Result of one batch invocation.
#[derive(Debug)]
pub struct BatchOutput {
    /// Fully processed descriptors, in input order.
    pub processed: Vec<ProcessedFile>,
    /// Files turned away by validation; not counted as processing failures.
    pub rejected: Vec<RejectedUpload>,
    /// Aggregated per-file processing failures, if any.
    pub error: Option<String>,
}

/// The ingestion pipeline. Holds one policy plus the external-tool
/// capabilities; construct one per policy.
pub struct UploadPipeline {
    validator: UploadValidator,
    writer: StorageWriter,
    processors: MediaProcessors,
    max_files_per_batch: Option<usize>,
}

impl UploadPipeline {
    pub fn new(
        policy: UploadPolicy,
        thumbnailer: Arc<dyn ThumbnailExtractor>,
        probe: Arc<dyn StreamProbe>,
    ) -> Self {
        let processors = MediaProcessors::new(&policy, thumbnailer, probe);
        let max_files_per_batch = policy.max_files_per_batch;
        Self {
            validator: UploadValidator::new(policy),
            writer: StorageWriter::new(),
            processors,
            max_files_per_batch,
        }
    }

    /// Pipeline backed by `ffmpeg`/`ffprobe` found on `PATH`.
    pub fn with_ffmpeg(policy: UploadPolicy) -> Result<Self> {
        let thumbnailer = Arc::new(FfmpegThumbnailer::new("ffmpeg", policy.tool_timeout)?);
        let probe = Arc::new(FfprobeStreamProbe::new("ffprobe", policy.tool_timeout)?);
        Ok(Self::new(policy, thumbnailer, probe))
    }

    /// Ingest a batch of uploads under `category`.
    pub async fn ingest(
        &self,
        sources: &[Arc<dyn UploadSource>],
        category: &str,
    ) -> Result<BatchOutput> {
        self.ingest_with_cancel(sources, category, &CancellationToken::new())
            .await
    }

    /// [`ingest`](Self::ingest) with a caller-supplied cancellation token,
    /// checked between files in both the validation and processing phases.
    /// Work already completed is kept.
    pub async fn ingest_with_cancel(
        &self,
        sources: &[Arc<dyn UploadSource>],
        category: &str,
        cancel: &CancellationToken,
    ) -> Result<BatchOutput> {
        if let Some(max) = self.max_files_per_batch {
            if sources.len() > max {
                anyhow::bail!("Too many files: maximum {} allowed", max);
            }
        }

        let mut outcomes = Vec::with_capacity(sources.len());
        for source in sources {
            if cancel.is_cancelled() {
                tracing::info!("Batch ingestion cancelled");
                break;
            }
            outcomes.push(self.validator.validate(source.as_ref(), category).await);
        }

        let mut processed = Vec::new();
        let mut rejected = Vec::new();
        let mut failures = Vec::new();

        for (source, outcome) in sources.iter().zip(outcomes) {
            if cancel.is_cancelled() {
                tracing::info!("Batch ingestion cancelled");
                break;
            }

            let file = match outcome {
                ValidationOutcome::Valid(file) => file,
                ValidationOutcome::Rejected(rejection) => {
                    rejected.push(rejection);
                    continue;
                }
            };

            if let Err(err) = self.writer.write(source.as_ref(), &file.storage_path).await {
                failures.push(format!("Error processing {}: {}", file.original_name, err));
                continue;
            }

            match self.processors.process(file).await {
                Ok(file) => processed.push(file),
                Err(err) => {
                    failures.push(format!("Error processing {}: {}", source.original_name(), err));
                }
            }
        }

        Ok(BatchOutput {
            processed,
            rejected,
            error: aggregate(failures),
        })
    }

    /// Run per-kind processing over already-validated, already-stored
    /// descriptors. Rejected outcomes are skipped entirely.
    pub async fn process_batch(&self, outcomes: Vec<ValidationOutcome>) -> BatchOutput {
        self.process_batch_with_cancel(outcomes, &CancellationToken::new())
            .await
    }

    pub async fn process_batch_with_cancel(
        &self,
        outcomes: Vec<ValidationOutcome>,
        cancel: &CancellationToken,
    ) -> BatchOutput {
        let mut processed = Vec::new();
        let mut rejected = Vec::new();
        let mut failures = Vec::new();

        for outcome in outcomes {
            if cancel.is_cancelled() {
                tracing::info!("Batch processing cancelled");
                break;
            }

            let file = match outcome {
                ValidationOutcome::Valid(file) => file,
                ValidationOutcome::Rejected(rejection) => {
                    rejected.push(rejection);
                    continue;
                }
            };

            let original_name = file.original_name.clone();
            match self.processors.process(file).await {
                Ok(file) => processed.push(file),
                Err(err) => failures.push(format!("Error processing {}: {}", original_name, err)),
            }
        }

        BatchOutput {
            processed,
            rejected,
            error: aggregate(failures),
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        self.validator.policy()
    }
}

fn aggregate(failures: Vec<String>) -> Option<String> {
    if failures.is_empty() {
        None
    } else {
        Some(format!(
            "Some files failed to process: {}",
            failures.join("; ")
        ))
    }
}

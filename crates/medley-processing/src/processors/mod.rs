//! Per-kind media processors.
//!
//! Each processor opens the stored primary artifact and enriches the
//! descriptor with kind-specific derived data. Processors are only reached
//! through [`MediaProcessors::process`]; an `unknown` kind is never routed
//! to one.

mod audio;
mod document;
mod image;
mod video;

use std::sync::Arc;

use anyhow::Result;
use medley_core::{MediaKind, ProcessedFile, UploadPolicy};

use crate::tools::{StreamProbe, ThumbnailExtractor};

pub use audio::AudioFileProcessor;
pub use document::DocumentFileProcessor;
pub use image::ImageFileProcessor;
pub use video::VideoFileProcessor;

/// Shared precondition: the primary artifact must already be on disk.
/// Guards against pipeline misuse, not against races.
async fn ensure_artifact_exists(file: &ProcessedFile, kind: &str) -> Result<()> {
    if !tokio::fs::try_exists(&file.storage_path).await.unwrap_or(false) {
        anyhow::bail!(
            "{} file does not exist: {}",
            kind,
            file.storage_path.display()
        );
    }
    Ok(())
}

/// Media-kind dispatch over the four processors.
pub struct MediaProcessors {
    image: ImageFileProcessor,
    video: VideoFileProcessor,
    audio: AudioFileProcessor,
    document: DocumentFileProcessor,
}

impl MediaProcessors {
    pub fn new(
        policy: &UploadPolicy,
        thumbnailer: Arc<dyn ThumbnailExtractor>,
        probe: Arc<dyn StreamProbe>,
    ) -> Self {
        Self {
            image: ImageFileProcessor::from_policy(policy),
            video: VideoFileProcessor::new(Arc::clone(&thumbnailer), Arc::clone(&probe)),
            audio: AudioFileProcessor::new(thumbnailer, probe),
            document: DocumentFileProcessor::new(),
        }
    }

    /// Run exactly the processor matching the descriptor's media kind.
    pub async fn process(&self, file: ProcessedFile) -> Result<ProcessedFile> {
        match file.media_kind {
            MediaKind::Image => self.image.process(file).await,
            MediaKind::Video => self.video.process(file).await,
            MediaKind::Audio => self.audio.process(file).await,
            MediaKind::Document => self.document.process(file).await,
            MediaKind::Unknown => anyhow::bail!("Unsupported media type: unknown"),
        }
    }
}

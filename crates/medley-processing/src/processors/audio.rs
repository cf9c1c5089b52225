//! Audio processing: waveform thumbnail and duration probe.

use std::sync::Arc;

use anyhow::Result;
use medley_core::ProcessedFile;

use crate::naming;
use crate::tools::{StreamProbe, ThumbnailExtractor};

/// Processes stored audio files. Waveform rendering and the duration probe
/// are both soft failures.
pub struct AudioFileProcessor {
    thumbnailer: Arc<dyn ThumbnailExtractor>,
    probe: Arc<dyn StreamProbe>,
}

impl AudioFileProcessor {
    pub fn new(thumbnailer: Arc<dyn ThumbnailExtractor>, probe: Arc<dyn StreamProbe>) -> Self {
        Self { thumbnailer, probe }
    }

    pub async fn process(&self, mut file: ProcessedFile) -> Result<ProcessedFile> {
        super::ensure_artifact_exists(&file, "audio").await?;

        match self.render_waveform(&file).await {
            Ok((path, name)) => file.set_thumbnail(path, name),
            Err(err) => {
                tracing::warn!(
                    path = %file.storage_path.display(),
                    error = %err,
                    "Failed to generate audio waveform thumbnail"
                );
            }
        }

        match self.probe.probe_duration(&file.storage_path).await {
            Ok(duration) => file.duration_seconds = duration,
            Err(err) => {
                tracing::warn!(
                    path = %file.storage_path.display(),
                    error = %err,
                    "Failed to probe audio duration"
                );
            }
        }

        Ok(file)
    }

    async fn render_waveform(&self, file: &ProcessedFile) -> Result<(std::path::PathBuf, String)> {
        let thumb_dir = naming::thumbnail_dir(&file.storage_path);
        tokio::fs::create_dir_all(&thumb_dir).await?;

        let thumb_name = naming::jpeg_thumbnail_name(&file.unique_name);
        let thumb_path = thumb_dir.join(&thumb_name);
        self.thumbnailer
            .render_waveform(&file.storage_path, &thumb_path)
            .await?;
        Ok((thumb_path, thumb_name))
    }
}

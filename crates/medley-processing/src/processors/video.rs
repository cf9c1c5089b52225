//! Video processing: frame thumbnail and stream probe.

use std::sync::Arc;

use anyhow::Result;
use medley_core::ProcessedFile;

use crate::naming;
use crate::tools::{StreamProbe, ThumbnailExtractor};

/// Processes stored videos.
///
/// Both the thumbnail and the probe are soft failures: the primary video
/// artifact is usable without either, so errors are logged and the
/// corresponding descriptor fields stay unset.
pub struct VideoFileProcessor {
    thumbnailer: Arc<dyn ThumbnailExtractor>,
    probe: Arc<dyn StreamProbe>,
}

impl VideoFileProcessor {
    pub fn new(thumbnailer: Arc<dyn ThumbnailExtractor>, probe: Arc<dyn StreamProbe>) -> Self {
        Self { thumbnailer, probe }
    }

    pub async fn process(&self, mut file: ProcessedFile) -> Result<ProcessedFile> {
        super::ensure_artifact_exists(&file, "video").await?;

        match self.generate_thumbnail(&file).await {
            Ok((path, name)) => file.set_thumbnail(path, name),
            Err(err) => {
                tracing::warn!(
                    path = %file.storage_path.display(),
                    error = %err,
                    "Failed to generate video thumbnail"
                );
            }
        }

        match self.probe.probe_video(&file.storage_path).await {
            Ok(probe) => {
                file.width = probe.width;
                file.height = probe.height;
                file.duration_seconds = probe.duration_seconds;
            }
            Err(err) => {
                tracing::warn!(
                    path = %file.storage_path.display(),
                    error = %err,
                    "Failed to probe video stream"
                );
            }
        }

        Ok(file)
    }

    async fn generate_thumbnail(
        &self,
        file: &ProcessedFile,
    ) -> Result<(std::path::PathBuf, String)> {
        let thumb_dir = naming::thumbnail_dir(&file.storage_path);
        tokio::fs::create_dir_all(&thumb_dir).await?;

        let thumb_name = naming::jpeg_thumbnail_name(&file.unique_name);
        let thumb_path = thumb_dir.join(&thumb_name);
        self.thumbnailer
            .extract_frame(&file.storage_path, &thumb_path)
            .await?;
        Ok((thumb_path, thumb_name))
    }
}

//! Image processing: optional in-place compression, dimensions, thumbnail.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, ImageFormat};
use medley_core::{ProcessedFile, UploadPolicy};

use crate::naming;

const THUMBNAIL_BOUND: u32 = 300;
const THUMBNAIL_QUALITY: u8 = 75;

/// Processes stored images.
///
/// Compression failures keep the original artifact and are non-fatal; a
/// thumbnail failure is fatal for the file because downstream consumers
/// assume image thumbnails exist.
pub struct ImageFileProcessor {
    compress: bool,
    max_dimension: u32,
    quality: u8,
}

impl ImageFileProcessor {
    pub fn from_policy(policy: &UploadPolicy) -> Self {
        Self {
            compress: policy.compress_images,
            max_dimension: policy.compress_max_dimension,
            quality: policy.compress_quality,
        }
    }

    pub async fn process(&self, mut file: ProcessedFile) -> Result<ProcessedFile> {
        super::ensure_artifact_exists(&file, "image").await?;

        if self.compress {
            let path = file.storage_path.clone();
            let max_dimension = self.max_dimension;
            let quality = self.quality;
            let compressed = tokio::task::spawn_blocking(move || {
                compress_in_place(&path, max_dimension, quality)
            })
            .await?;
            if let Err(err) = compressed {
                tracing::warn!(
                    path = %file.storage_path.display(),
                    error = %err,
                    "Failed to compress image, keeping original"
                );
            }
        }

        let thumb_dir = naming::thumbnail_dir(&file.storage_path);
        tokio::fs::create_dir_all(&thumb_dir)
            .await
            .context("Failed to create thumbnail directory")?;

        let thumb_name = format!("thumb_{}", file.unique_name);
        let thumb_path = thumb_dir.join(&thumb_name);

        // Decode once for both the dimension read and the thumbnail; image
        // work is CPU-bound, so it runs off the async pool.
        let storage_path = file.storage_path.clone();
        let thumb_dest = thumb_path.clone();
        let (width, height) = tokio::task::spawn_blocking(move || {
            let img = image::open(&storage_path)
                .with_context(|| format!("Failed to open image: {}", storage_path.display()))?;
            let dims = img.dimensions();

            // Fit within the bound without ever upscaling; a tiny upload
            // keeps its native thumbnail size.
            let thumbnail = if dims.0 > THUMBNAIL_BOUND || dims.1 > THUMBNAIL_BOUND {
                img.resize(THUMBNAIL_BOUND, THUMBNAIL_BOUND, FilterType::Lanczos3)
            } else {
                img
            };
            save_with_quality(&thumbnail, &thumb_dest, THUMBNAIL_QUALITY)
                .with_context(|| format!("Failed to save thumbnail: {}", thumb_dest.display()))?;

            Ok::<_, anyhow::Error>(dims)
        })
        .await??;

        file.width = Some(width);
        file.height = Some(height);
        file.set_thumbnail(thumb_path, thumb_name);
        Ok(file)
    }
}

/// Re-encode the image at `path` if either dimension exceeds `max_dimension`,
/// resizing with aspect ratio preserved.
fn compress_in_place(path: &Path, max_dimension: u32, quality: u8) -> Result<()> {
    let img = image::open(path).context("Failed to open image for compression")?;
    let (width, height) = img.dimensions();

    if width > max_dimension || height > max_dimension {
        let resized = img.resize(max_dimension, max_dimension, FilterType::Lanczos3);
        save_with_quality(&resized, path, quality).context("Failed to save compressed image")?;
        tracing::info!(
            path = %path.display(),
            from = %format!("{}x{}", width, height),
            to = %format!("{}x{}", resized.width(), resized.height()),
            "Compressed image in place"
        );
    }

    Ok(())
}

/// Save an image, honoring the quality setting for JPEG output. Other
/// formats encode with their defaults.
fn save_with_quality(img: &DynamicImage, path: &Path, quality: u8) -> Result<PathBuf> {
    match ImageFormat::from_path(path) {
        Ok(ImageFormat::Jpeg) => {
            let out = fs::File::create(path)?;
            let encoder = JpegEncoder::new_with_quality(BufWriter::new(out), quality);
            img.write_with_encoder(encoder)?;
        }
        _ => img.save(path)?,
    }
    Ok(path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use medley_core::MediaKind;
    use tempfile::tempdir;

    fn write_png(path: &Path, width: u32, height: u32) {
        let img = DynamicImage::new_rgb8(width, height);
        img.save(path).unwrap();
    }

    fn descriptor(path: &Path, unique_name: &str) -> ProcessedFile {
        ProcessedFile {
            original_name: "input.png".into(),
            unique_name: unique_name.into(),
            storage_path: path.to_path_buf(),
            relative_path: "posts/image/2026-08-31".into(),
            media_kind: MediaKind::Image,
            mime_type: "image/png".into(),
            size_bytes: 0,
            thumbnail_path: None,
            thumbnail_name: None,
            width: None,
            height: None,
            duration_seconds: None,
        }
    }

    fn no_compression() -> ImageFileProcessor {
        ImageFileProcessor {
            compress: false,
            max_dimension: 2000,
            quality: 85,
        }
    }

    #[tokio::test]
    async fn records_dimensions_and_writes_thumbnail() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("input_0123456789ab.png");
        write_png(&path, 800, 600);

        let out = no_compression()
            .process(descriptor(&path, "input_0123456789ab.png"))
            .await
            .unwrap();

        assert_eq!(out.width, Some(800));
        assert_eq!(out.height, Some(600));
        let thumb = out.thumbnail_path.unwrap();
        assert!(thumb.ends_with("thumbnails/thumb_input_0123456789ab.png"));
        let (tw, th) = image::open(&thumb).unwrap().dimensions();
        assert!(tw <= 300 && th <= 300);
        assert_eq!(
            out.thumbnail_name.as_deref(),
            Some("thumb_input_0123456789ab.png")
        );
    }

    #[tokio::test]
    async fn small_image_thumbnail_keeps_native_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tiny_0123456789ab.png");
        write_png(&path, 8, 8);

        let out = no_compression()
            .process(descriptor(&path, "tiny_0123456789ab.png"))
            .await
            .unwrap();

        assert_eq!(out.width, Some(8));
        assert_eq!(out.height, Some(8));
        let thumb = out.thumbnail_path.unwrap();
        assert_eq!(image::open(&thumb).unwrap().dimensions(), (8, 8));
    }

    #[tokio::test]
    async fn small_images_are_not_compressed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("small_0123456789ab.png");
        write_png(&path, 400, 300);

        let processor = ImageFileProcessor {
            compress: true,
            max_dimension: 2000,
            quality: 85,
        };
        let out = processor
            .process(descriptor(&path, "small_0123456789ab.png"))
            .await
            .unwrap();

        // Smaller than the limit on both axes, dimensions unchanged.
        assert_eq!(out.width, Some(400));
        assert_eq!(out.height, Some(300));
    }

    #[tokio::test]
    async fn oversized_images_are_resized_in_place() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("big_0123456789ab.png");
        write_png(&path, 1200, 600);

        let processor = ImageFileProcessor {
            compress: true,
            max_dimension: 640,
            quality: 85,
        };
        let out = processor
            .process(descriptor(&path, "big_0123456789ab.png"))
            .await
            .unwrap();

        assert_eq!(out.width, Some(640));
        assert_eq!(out.height, Some(320));
    }

    #[tokio::test]
    async fn failed_compression_keeps_the_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("locked_0123456789ab.png");
        write_png(&path, 1200, 600);

        let mut perms = fs::metadata(&path).unwrap().permissions();
        perms.set_readonly(true);
        fs::set_permissions(&path, perms).unwrap();
        if fs::OpenOptions::new().write(true).open(&path).is_ok() {
            // Privileged users bypass the permission bit, so the write
            // cannot be made to fail here.
            return;
        }

        let processor = ImageFileProcessor {
            compress: true,
            max_dimension: 640,
            quality: 85,
        };
        let out = processor
            .process(descriptor(&path, "locked_0123456789ab.png"))
            .await
            .unwrap();

        // The artifact keeps its original dimensions and processing
        // still completes with a thumbnail.
        assert_eq!(out.width, Some(1200));
        assert_eq!(out.height, Some(600));
        assert!(out.thumbnail_path.is_some());
    }

    #[tokio::test]
    async fn missing_artifact_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone.png");
        let result = no_compression().process(descriptor(&path, "gone.png")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn undecodable_image_fails_processing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken_0123456789ab.png");
        fs::write(&path, b"\x89PNG\r\n\x1a\x0abut not really").unwrap();

        let result = no_compression()
            .process(descriptor(&path, "broken_0123456789ab.png"))
            .await;
        assert!(result.is_err());
    }
}

//! Shared fixtures for pipeline integration tests: canned external-tool
//! doubles, synthetic media payloads, and pipeline construction.

use std::io;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use medley_core::UploadPolicy;
use medley_processing::{
    MediaProbe, MemoryUpload, StreamProbe, ThumbnailExtractor, ToolError, UploadPipeline,
    UploadSource,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medley=debug".into()),
        )
        .with_test_writer()
        .try_init();
}

/// Thumbnailer double: writes a stub JPEG on success, or fails with a canned
/// tool error.
pub struct FakeThumbnailer {
    pub fail: bool,
}

#[async_trait]
impl ThumbnailExtractor for FakeThumbnailer {
    async fn extract_frame(&self, _input: &Path, output: &Path) -> Result<(), ToolError> {
        self.write_stub(output).await
    }

    async fn render_waveform(&self, _input: &Path, output: &Path) -> Result<(), ToolError> {
        self.write_stub(output).await
    }
}

impl FakeThumbnailer {
    async fn write_stub(&self, output: &Path) -> Result<(), ToolError> {
        if self.fail {
            return Err(ToolError::Failed {
                tool: "ffmpeg".to_string(),
                stderr: "ffmpeg: command not found".to_string(),
            });
        }
        tokio::fs::write(output, b"\xFF\xD8\xFF\xD9")
            .await
            .map_err(|source| ToolError::Launch {
                tool: "ffmpeg".to_string(),
                source,
            })
    }
}

/// Probe double returning fixed values, or failing outright.
pub struct FakeProbe {
    pub fail: bool,
    pub probe: MediaProbe,
}

impl FakeProbe {
    pub fn unavailable() -> Self {
        Self {
            fail: true,
            probe: MediaProbe::default(),
        }
    }
}

#[async_trait]
impl StreamProbe for FakeProbe {
    async fn probe_video(&self, _input: &Path) -> Result<MediaProbe, ToolError> {
        if self.fail {
            return Err(ToolError::Failed {
                tool: "ffprobe".to_string(),
                stderr: "ffprobe: command not found".to_string(),
            });
        }
        Ok(self.probe)
    }

    async fn probe_duration(&self, _input: &Path) -> Result<Option<u32>, ToolError> {
        if self.fail {
            return Err(ToolError::Failed {
                tool: "ffprobe".to_string(),
                stderr: "ffprobe: command not found".to_string(),
            });
        }
        Ok(self.probe.duration_seconds)
    }
}

/// Upload source that lies about its size, for limit tests that should not
/// allocate the declared number of bytes.
pub struct DeclaredSizeUpload {
    inner: MemoryUpload,
    declared_size: u64,
}

impl DeclaredSizeUpload {
    pub fn new(name: &str, data: impl Into<Bytes>, declared_size: u64) -> Self {
        Self {
            inner: MemoryUpload::new(name, data),
            declared_size,
        }
    }
}

#[async_trait]
impl UploadSource for DeclaredSizeUpload {
    fn original_name(&self) -> &str {
        self.inner.original_name()
    }

    fn declared_size(&self) -> u64 {
        self.declared_size
    }

    async fn open(&self) -> io::Result<medley_processing::source::UploadReader> {
        self.inner.open().await
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::new_rgb8(width, height);
    let mut out = std::io::Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png).unwrap();
    out.into_inner()
}

/// PNG signature followed by junk: sniffs as an image, fails to decode.
pub fn corrupt_png_bytes() -> Vec<u8> {
    let mut bytes = b"\x89PNG\r\n\x1a\n".to_vec();
    bytes.extend_from_slice(&[0xAB; 64]);
    bytes
}

pub fn mp4_bytes() -> Vec<u8> {
    let mut bytes = vec![0x00, 0x00, 0x00, 0x18];
    bytes.extend_from_slice(b"ftypisom");
    bytes.extend_from_slice(&[0u8; 32]);
    bytes
}

pub fn mp3_bytes() -> Vec<u8> {
    let mut bytes = b"ID3\x04\x00\x00\x00\x00\x00\x00".to_vec();
    bytes.extend_from_slice(&[0u8; 32]);
    bytes
}

pub fn pdf_bytes() -> Vec<u8> {
    b"%PDF-1.4\n1 0 obj\n<< /Type /Catalog >>\nendobj\n".to_vec()
}

pub fn default_allowed_types() -> Vec<String> {
    [
        "image/png",
        "image/jpeg",
        "video/mp4",
        "audio/mpeg",
        "application/pdf",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

pub fn test_policy(root: &Path) -> UploadPolicy {
    UploadPolicy::new(root, default_allowed_types())
}

pub fn pipeline_with(
    policy: UploadPolicy,
    thumbnailer: FakeThumbnailer,
    probe: FakeProbe,
) -> UploadPipeline {
    UploadPipeline::new(policy, Arc::new(thumbnailer), Arc::new(probe))
}

pub fn working_tools_pipeline(policy: UploadPolicy) -> UploadPipeline {
    pipeline_with(
        policy,
        FakeThumbnailer { fail: false },
        FakeProbe {
            fail: false,
            probe: MediaProbe {
                width: Some(1920),
                height: Some(1080),
                duration_seconds: Some(13),
            },
        },
    )
}

pub fn upload(name: &str, data: Vec<u8>) -> Arc<dyn UploadSource> {
    Arc::new(MemoryUpload::new(name, data))
}

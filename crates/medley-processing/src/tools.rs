//! External transcoder capabilities.
//!
//! Thumbnail extraction and stream probing are abstracted behind traits so
//! the per-kind processors never depend on a specific binary and tests can
//! swap in canned doubles. The production implementations shell out to
//! `ffmpeg`/`ffprobe` synchronously per invocation, with a bounded timeout
//! so a hung tool cannot hang the whole batch.

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Failed to execute {tool}: {source}")]
    Launch {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} failed: {stderr}")]
    Failed { tool: String, stderr: String },

    #[error("{tool} timed out after {timeout:?}")]
    TimedOut { tool: String, timeout: Duration },

    #[error("Invalid tool path: {0}")]
    InvalidToolPath(String),
}

/// Numeric stream properties, each independently optional since probe output
/// may be partial. Zero is a legitimate measured value, hence no sentinels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MediaProbe {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<u32>,
}

/// Renders derived thumbnail images from stored media.
#[async_trait]
pub trait ThumbnailExtractor: Send + Sync {
    /// Extract a single frame at 00:00:01 as a JPEG.
    async fn extract_frame(&self, input: &Path, output: &Path) -> Result<(), ToolError>;

    /// Render a fixed-size 640x120 waveform image for an audio file.
    async fn render_waveform(&self, input: &Path, output: &Path) -> Result<(), ToolError>;
}

/// Probes numeric stream properties from stored media.
#[async_trait]
pub trait StreamProbe: Send + Sync {
    /// Width, height and duration of the first video stream. Partial output
    /// is not an error.
    async fn probe_video(&self, input: &Path) -> Result<MediaProbe, ToolError>;

    /// Container duration in whole seconds, if reported.
    async fn probe_duration(&self, input: &Path) -> Result<Option<u32>, ToolError>;
}

/// Reject executable paths carrying shell metacharacters or traversal.
fn validate_tool_path(path: &str) -> Result<(), ToolError> {
    let ok = !path.is_empty()
        && !path.contains("..")
        && path
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '/' | '-' | '_' | '.' | '\\'));
    if ok {
        Ok(())
    } else {
        Err(ToolError::InvalidToolPath(path.to_string()))
    }
}

async fn run_tool(
    tool: &str,
    mut command: Command,
    timeout: Duration,
) -> Result<std::process::Output, ToolError> {
    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = tokio::time::timeout(timeout, command.output())
        .await
        .map_err(|_| ToolError::TimedOut {
            tool: tool.to_string(),
            timeout,
        })?
        .map_err(|source| ToolError::Launch {
            tool: tool.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(ToolError::Failed {
            tool: tool.to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    Ok(output)
}

/// `ffmpeg`-backed thumbnail extraction.
pub struct FfmpegThumbnailer {
    ffmpeg_path: String,
    timeout: Duration,
}

impl FfmpegThumbnailer {
    pub fn new(ffmpeg_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffmpeg_path = ffmpeg_path.into();
        validate_tool_path(&ffmpeg_path)?;
        Ok(Self {
            ffmpeg_path,
            timeout,
        })
    }
}

#[async_trait]
impl ThumbnailExtractor for FfmpegThumbnailer {
    #[tracing::instrument(skip(self, input, output), fields(tool = "ffmpeg", operation = "frame"))]
    async fn extract_frame(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .args(["-ss", "00:00:01", "-vframes", "1", "-q:v", "2"])
            .arg(output);
        run_tool("ffmpeg", cmd, self.timeout).await?;
        Ok(())
    }

    #[tracing::instrument(skip(self, input, output), fields(tool = "ffmpeg", operation = "waveform"))]
    async fn render_waveform(&self, input: &Path, output: &Path) -> Result<(), ToolError> {
        let mut cmd = Command::new(&self.ffmpeg_path);
        cmd.arg("-y")
            .arg("-i")
            .arg(input)
            .args([
                "-filter_complex",
                "showwavespic=s=640x120:colors=#3498db",
                "-frames:v",
                "1",
            ])
            .arg(output);
        run_tool("ffmpeg", cmd, self.timeout).await?;
        Ok(())
    }
}

/// `ffprobe`-backed stream probing.
pub struct FfprobeStreamProbe {
    ffprobe_path: String,
    timeout: Duration,
}

impl FfprobeStreamProbe {
    pub fn new(ffprobe_path: impl Into<String>, timeout: Duration) -> Result<Self, ToolError> {
        let ffprobe_path = ffprobe_path.into();
        validate_tool_path(&ffprobe_path)?;
        Ok(Self {
            ffprobe_path,
            timeout,
        })
    }
}

#[async_trait]
impl StreamProbe for FfprobeStreamProbe {
    #[tracing::instrument(skip(self, input), fields(tool = "ffprobe", operation = "probe_video"))]
    async fn probe_video(&self, input: &Path) -> Result<MediaProbe, ToolError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-show_entries",
            "stream=width,height,duration",
            "-of",
            "csv=p=0",
        ])
        .arg(input);
        let output = run_tool("ffprobe", cmd, self.timeout).await?;
        Ok(parse_video_probe(&String::from_utf8_lossy(&output.stdout)))
    }

    #[tracing::instrument(skip(self, input), fields(tool = "ffprobe", operation = "probe_duration"))]
    async fn probe_duration(&self, input: &Path) -> Result<Option<u32>, ToolError> {
        let mut cmd = Command::new(&self.ffprobe_path);
        cmd.args([
            "-v",
            "error",
            "-show_entries",
            "format=duration",
            "-of",
            "csv=p=0",
        ])
        .arg(input);
        let output = run_tool("ffprobe", cmd, self.timeout).await?;
        Ok(parse_duration(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// Parse `width,height[,duration]` CSV. Dimensions need both fields;
/// duration needs the third. Unparseable fields are left unset.
fn parse_video_probe(stdout: &str) -> MediaProbe {
    let values: Vec<&str> = stdout.trim().split(',').collect();
    let mut probe = MediaProbe::default();

    if values.len() >= 2 {
        if let (Ok(w), Ok(h)) = (values[0].trim().parse(), values[1].trim().parse()) {
            probe.width = Some(w);
            probe.height = Some(h);
        }
    }
    if values.len() == 3 {
        probe.duration_seconds = parse_duration(values[2]);
    }

    probe
}

/// Parse a floating-point duration field, rounded to the nearest second.
fn parse_duration(field: &str) -> Option<u32> {
    let trimmed = field.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().map(|d| d.round().max(0.0) as u32)
}

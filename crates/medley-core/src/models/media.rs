//! Media descriptor models.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Coarse media classification derived from the sniffed MIME type.
///
/// Derived from content, never from the client-declared filename extension;
/// a spoofed extension therefore cannot steer a file into the wrong
/// processing branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
    Audio,
    Document,
    Unknown,
}

impl MediaKind {
    /// Prefix rule: `image/*` → image, `video/*` → video, `audio/*` → audio,
    /// `application/*` or `text/*` → document, anything else → unknown.
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("image/") {
            MediaKind::Image
        } else if mime_type.starts_with("video/") {
            MediaKind::Video
        } else if mime_type.starts_with("audio/") {
            MediaKind::Audio
        } else if mime_type.starts_with("application/") || mime_type.starts_with("text/") {
            MediaKind::Document
        } else {
            MediaKind::Unknown
        }
    }

    /// Lowercase name, used as the storage partition segment.
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Audio => "audio",
            MediaKind::Document => "document",
            MediaKind::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor for one ingested file, enriched as it moves through the
/// pipeline.
///
/// Created by the validator (pre-storage), mutated only by the single
/// per-kind processor matching `media_kind`, immutable once returned from the
/// batch pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedFile {
    /// Client-declared filename, kept for diagnostics only.
    pub original_name: String,
    /// Sanitized, collision-resistant name assigned exactly once.
    pub unique_name: String,
    /// Absolute location of the primary artifact.
    pub storage_path: PathBuf,
    /// `category/kind/date` partition, used downstream to build public URLs.
    pub relative_path: String,
    pub media_kind: MediaKind,
    /// Sniffed from content, not trusted from the declared name.
    pub mime_type: String,
    pub size_bytes: u64,
    pub thumbnail_path: Option<PathBuf>,
    pub thumbnail_name: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub duration_seconds: Option<u32>,
}

impl ProcessedFile {
    /// Record a produced thumbnail. Path and name are always set together so
    /// the descriptor never carries one without the other.
    pub fn set_thumbnail(&mut self, path: PathBuf, name: String) {
        self.thumbnail_path = Some(path);
        self.thumbnail_name = Some(name);
    }
}

/// A file that failed validation, with the reasons it was turned away.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RejectedUpload {
    pub original_name: String,
    /// Non-empty, in the order the checks ran.
    pub errors: Vec<String>,
}

/// Result of validating exactly one upload.
#[derive(Debug, Clone)]
pub enum ValidationOutcome {
    /// Policy checks passed; the descriptor is populated but nothing has been
    /// written to storage yet.
    Valid(ProcessedFile),
    Rejected(RejectedUpload),
}

impl ValidationOutcome {
    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationOutcome::Valid(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_from_mime_prefix() {
        assert_eq!(MediaKind::from_mime("image/png"), MediaKind::Image);
        assert_eq!(MediaKind::from_mime("video/mp4"), MediaKind::Video);
        assert_eq!(MediaKind::from_mime("audio/mpeg"), MediaKind::Audio);
        assert_eq!(MediaKind::from_mime("application/pdf"), MediaKind::Document);
        assert_eq!(MediaKind::from_mime("text/plain"), MediaKind::Document);
        assert_eq!(MediaKind::from_mime("font/woff2"), MediaKind::Unknown);
        assert_eq!(MediaKind::from_mime(""), MediaKind::Unknown);
    }

    #[test]
    fn kind_partition_segment() {
        assert_eq!(MediaKind::Image.as_str(), "image");
        assert_eq!(MediaKind::Unknown.to_string(), "unknown");
    }

    #[test]
    fn thumbnail_fields_set_together() {
        let mut file = ProcessedFile {
            original_name: "a.png".into(),
            unique_name: "a_0123456789ab.png".into(),
            storage_path: PathBuf::from("/tmp/a_0123456789ab.png"),
            relative_path: "posts/image/2026-08-31".into(),
            media_kind: MediaKind::Image,
            mime_type: "image/png".into(),
            size_bytes: 10,
            thumbnail_path: None,
            thumbnail_name: None,
            width: None,
            height: None,
            duration_seconds: None,
        };
        assert!(file.thumbnail_path.is_none() && file.thumbnail_name.is_none());
        file.set_thumbnail(
            PathBuf::from("/tmp/thumbnails/thumb_a_0123456789ab.png"),
            "thumb_a_0123456789ab.png".into(),
        );
        assert!(file.thumbnail_path.is_some() && file.thumbnail_name.is_some());
    }
}

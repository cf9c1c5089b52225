//! Name and storage path allocation.
//!
//! Unique names are sanitized to a filesystem-safe character set and made
//! collision-resistant with an appended random identifier. Storage paths are
//! partitioned by `category/kind/date`; the partition date is the wall-clock
//! date at allocation time, so an upload spanning midnight may land under
//! the next day. That skew is accepted.

use std::path::{Path, PathBuf};

use medley_core::MediaKind;
use thiserror::Error;
use uuid::Uuid;

const MAX_BASE_NAME_LEN: usize = 100;
const UNIQUE_ID_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum AllocError {
    #[error("Invalid category label: {0}")]
    InvalidCategory(String),

    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Replace every character outside `[A-Za-z0-9.]` with `_`.
fn sanitize(part: &str) -> String {
    part.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '.' { c } else { '_' })
        .collect()
}

/// Derive a collision-resistant file name from the client-declared one.
///
/// `sanitized stem (≤ 100 chars)` + `_` + `12-char random id` + `extension`.
/// The result always matches `[A-Za-z0-9_.]+`; re-running for the same
/// logical upload never yields the same name.
pub fn unique_file_name(original_name: &str) -> String {
    let base = Path::new(original_name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(original_name);

    let (stem, extension) = match base.rfind('.') {
        Some(idx) if idx > 0 => (&base[..idx], &base[idx..]),
        _ => (base, ""),
    };

    let mut stem = sanitize(stem);
    stem.truncate(MAX_BASE_NAME_LEN);
    if stem.is_empty() {
        stem.push_str("file");
    }

    let id = Uuid::new_v4().simple().to_string();
    format!("{}_{}{}", stem, &id[..UNIQUE_ID_LEN], sanitize(extension))
}

/// Allocate the storage location for one file:
/// `(absolute path, category/kind/date partition)`.
///
/// Creates the partition directory tree if absent (idempotent, safe under
/// concurrent batches since per-file names are unique).
pub async fn allocate_storage_path(
    base_dir: &Path,
    category: &str,
    kind: MediaKind,
    file_name: &str,
) -> Result<(PathBuf, String), AllocError> {
    if category.is_empty()
        || category.contains("..")
        || category.contains('/')
        || category.contains('\\')
    {
        return Err(AllocError::InvalidCategory(category.to_string()));
    }

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let relative = format!("{}/{}/{}", category, kind, date);
    let dir = base_dir.join(&relative);

    tokio::fs::create_dir_all(&dir)
        .await
        .map_err(|source| AllocError::CreateDir {
            path: dir.clone(),
            source,
        })?;

    Ok((dir.join(file_name), relative))
}

/// Thumbnail directory beside a primary artifact.
pub fn thumbnail_dir(storage_path: &Path) -> PathBuf {
    storage_path
        .parent()
        .map(|d| d.join("thumbnails"))
        .unwrap_or_else(|| PathBuf::from("thumbnails"))
}

/// Thumbnail file name for a rendered JPEG (video frames, audio waveforms):
/// `thumb_<unique stem>.jpg`.
pub fn jpeg_thumbnail_name(unique_name: &str) -> String {
    let stem = match unique_name.rfind('.') {
        Some(idx) if idx > 0 => &unique_name[..idx],
        _ => unique_name,
    };
    format!("thumb_{}.jpg", stem)
}

//! Document processing: existence check only, no transformation.

use anyhow::Result;
use medley_core::ProcessedFile;

#[derive(Default)]
pub struct DocumentFileProcessor;

impl DocumentFileProcessor {
    pub fn new() -> Self {
        Self
    }

    pub async fn process(&self, file: ProcessedFile) -> Result<ProcessedFile> {
        super::ensure_artifact_exists(&file, "document").await?;
        Ok(file)
    }
}

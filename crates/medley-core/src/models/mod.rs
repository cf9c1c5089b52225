//! Data models for the ingestion pipeline
//!
//! Each sub-module covers one domain area. Models are re-exported here for
//! convenient imports.

mod media;

pub use media::*;

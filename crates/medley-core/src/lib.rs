//! Medley core library
//!
//! Domain models and policy configuration shared across the ingestion
//! pipeline. Everything with behavior (sniffing, validation, processing)
//! lives in `medley-processing`.

pub mod models;
pub mod policy;

pub use models::{MediaKind, ProcessedFile, RejectedUpload, ValidationOutcome};
pub use policy::UploadPolicy;

//! Medley processing library
//!
//! The ingestion pipeline: content sniffing, policy validation, name and
//! path allocation, storage writing, and per-kind media processing
//! (thumbnails, dimensions, durations). The batch entry point is
//! [`UploadPipeline`].
//!
//! External transcoder invocations go through the [`ThumbnailExtractor`] and
//! [`StreamProbe`] capability traits so tests can swap in canned doubles and
//! the processors stay decoupled from any specific binary.

pub mod naming;
pub mod pipeline;
pub mod processors;
pub mod sniff;
pub mod source;
pub mod store;
pub mod tools;
pub mod validator;

pub use pipeline::{BatchOutput, UploadPipeline};
pub use sniff::sniff_mime;
pub use source::{MemoryUpload, UploadSource};
pub use store::StorageWriter;
pub use tools::{
    FfmpegThumbnailer, FfprobeStreamProbe, MediaProbe, StreamProbe, ThumbnailExtractor, ToolError,
};
pub use validator::UploadValidator;

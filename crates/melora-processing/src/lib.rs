//! Melora Processing Library
//!
//! The ingestion side of the service: tag/stream metadata extraction,
//! thumbnail derivation, the upload pipeline that ties staging, extraction,
//! and the atomic commit together, and the retention handler that reclaims
//! storage when catalog records go away.

pub mod extract;
pub mod pipeline;
pub mod retention;
pub mod thumbnail;

pub use extract::{extract, ExtractError};
pub use pipeline::UploadPipeline;
pub use retention::RetentionHandler;
pub use thumbnail::ThumbnailDeriver;

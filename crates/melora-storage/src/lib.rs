//! Melora Storage Library
//!
//! Durable byte storage behind one `Storage` trait with two backends: the
//! local filesystem and an S3-compatible object store. Callers depend only on
//! the capability set, so further backends (e.g. in-memory for tests) can be
//! added without touching them.
//!
//! # Key namespaces
//!
//! All backends share one relative key layout:
//!
//! - `tmp/{uuid}{ext}` — staged uploads, owned by one in-flight pipeline run
//! - `songs/{uuid}{ext}` — committed audio files
//! - `thumbnails/{uuid}.jpg` — derived artwork
//!
//! Keys must not contain `..` or a leading `/`. Key generation is centralized
//! in the `keys` module so all backends stay consistent.

pub mod factory;
pub mod keys;
pub mod local;
pub mod s3;
pub mod traits;

pub use factory::create_storage;
pub use local::LocalStorage;
pub use melora_core::{BackendKind, StorageLocation};
pub use s3::{ensure_bucket, S3Storage};
pub use traits::{ByteStream, Storage, StorageError, StorageResult};

//! Storage abstraction trait
//!
//! This module defines the `Storage` trait that all storage backends must
//! implement, and the error type they report through.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use melora_core::{AppError, BackendKind, SignedAccessGrant, StorageLocation};
use std::path::PathBuf;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Write failed: {0}")]
    WriteFailed(String),

    #[error("Read failed: {0}")]
    ReadFailed(String),

    #[error("Delete failed: {0}")]
    DeleteFailed(String),

    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Lazy stream of byte chunks coming out of a backend.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound(key) => AppError::NotFound(key),
            StorageError::InvalidKey(msg) => AppError::InvalidInput(msg),
            other => AppError::Storage(other.to_string()),
        }
    }
}

/// Storage abstraction trait
///
/// Both backends expose the same contract; capabilities a backend lacks are
/// reported honestly (`signed_url` on local returns `Unsupported`,
/// `local_path` on S3 returns `None`) instead of being faked.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Which backend this is; the streaming layer branches on it.
    fn backend_kind(&self) -> BackendKind;

    /// Build the `StorageLocation` this backend assigns to a relative key.
    fn location(&self, key: &str) -> StorageLocation;

    /// Local filesystem path for this location, when the backend has one.
    ///
    /// The metadata extractor can only read local paths; callers use this to
    /// skip the temp-copy materialization step on the local backend.
    fn local_path(&self, location: &StorageLocation) -> Option<PathBuf>;

    /// Check whether bytes exist at this location.
    async fn exists(&self, location: &StorageLocation) -> StorageResult<bool>;

    /// Size in bytes of the object; `NotFound` if absent.
    async fn content_length(&self, location: &StorageLocation) -> StorageResult<u64>;

    /// Fully replace any content at this location.
    ///
    /// Atomic from the reader's perspective: no reader ever observes a
    /// partially written object at the final key.
    async fn write(&self, location: &StorageLocation, data: Bytes) -> StorageResult<()>;

    /// Stream the whole object as bounded chunks.
    async fn download_stream(&self, location: &StorageLocation) -> StorageResult<ByteStream>;

    /// Stream exactly `length` bytes starting at `offset`.
    ///
    /// Local seeks an open file handle; S3 issues a ranged GET. The stream is
    /// lazy and chunked, never the whole range in memory.
    async fn read_range(
        &self,
        location: &StorageLocation,
        offset: u64,
        length: u64,
    ) -> StorageResult<ByteStream>;

    /// Delete the object. Idempotent: deleting an absent location succeeds.
    async fn delete(&self, location: &StorageLocation) -> StorageResult<()>;

    /// Move an object from one location to another.
    ///
    /// Copy-then-delete where no native rename exists. All-or-nothing: on
    /// failure the destination does not exist and the source is left intact
    /// for retry.
    async fn rename(
        &self,
        from: &StorageLocation,
        to: &StorageLocation,
    ) -> StorageResult<()>;

    /// Issue a time-limited direct-access URL for this object.
    ///
    /// Object-store backends only; local returns `Unsupported`.
    async fn signed_url(
        &self,
        location: &StorageLocation,
        ttl: Duration,
    ) -> StorageResult<SignedAccessGrant>;
}

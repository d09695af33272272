//! Melora Core Library
//!
//! Shared domain types for the Melora media service: configuration, the error
//! taxonomy, storage locations and committed-media values, and the catalog
//! collaborator traits that the ingestion pipeline and the retention layer
//! talk to.

pub mod catalog;
pub mod config;
pub mod error;
pub mod models;

pub use catalog::{Catalog, CatalogError, MemoryCatalog};
pub use config::{BackendKind, Config, OrphanPolicy};
pub use error::{AppError, AppResult};
pub use models::{
    CommittedMedia, ExtractedMetadata, SignedAccessGrant, StorageLocation,
};

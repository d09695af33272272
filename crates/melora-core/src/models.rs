//! Domain models for stored media.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies exactly one stored byte sequence. Immutable once assigned to a
/// committed artifact.
///
/// Both variants carry a relative key in the shared namespace layout
/// (`tmp/...`, `songs/...`, `thumbnails/...`); the object variant additionally
/// names the bucket it lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StorageLocation {
    Local { relative_path: String },
    Object { bucket: String, key: String },
}

impl StorageLocation {
    /// The backend-relative key for this location.
    pub fn key(&self) -> &str {
        match self {
            StorageLocation::Local { relative_path } => relative_path,
            StorageLocation::Object { key, .. } => key,
        }
    }
}

impl std::fmt::Display for StorageLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageLocation::Local { relative_path } => write!(f, "local:{}", relative_path),
            StorageLocation::Object { bucket, key } => write!(f, "s3://{}/{}", bucket, key),
        }
    }
}

/// Tag and stream information pulled out of an uploaded audio file.
///
/// Produced once per upload; fields that the container does not carry stay
/// `None` rather than failing the extraction.
#[derive(Debug, Clone, Default)]
pub struct ExtractedMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Always derivable from stream info, never optional.
    pub duration_secs: u64,
    pub mime_type: Option<String>,
    /// Embedded artwork bytes, best-effort per format.
    pub artwork: Option<Vec<u8>>,
}

/// The durable result of a successful upload pipeline run.
///
/// Created exactly once per upload; `location` is derived from `id`, never
/// from a user-supplied name, and is never reused for different bytes.
#[derive(Debug, Clone, Serialize)]
pub struct CommittedMedia {
    pub id: Uuid,
    pub title: String,
    pub location: StorageLocation,
    pub size_bytes: u64,
    pub mime_type: String,
    pub duration_secs: u64,
    pub thumbnail: Option<StorageLocation>,
}

/// A time-limited direct-access URL for object-store-backed media.
///
/// Stateless and safe to regenerate; repeated grants for the same location
/// may differ but are equally valid until they expire.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignedAccessGrant {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

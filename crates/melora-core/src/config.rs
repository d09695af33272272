//! Configuration module
//!
//! Environment-driven configuration for the service. Everything the storage
//! backends, pipeline, and streaming layer need is resolved once at startup
//! and passed to component constructors; no ambient globals.

use std::env;
use std::str::FromStr;

const DEFAULT_SERVER_PORT: u16 = 8000;
const DEFAULT_STREAM_CHUNK_SIZE: usize = 64 * 1024;
const DEFAULT_SIGNED_URL_TTL_SECS: u64 = 3600;
const DEFAULT_THUMBNAIL_MAX_DIM: u32 = 200;

/// Which storage backend the service runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendKind {
    Local,
    S3,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" => Ok(BackendKind::Local),
            "s3" => Ok(BackendKind::S3),
            other => Err(format!("unknown storage backend: {}", other)),
        }
    }
}

/// What happens to artist/album rows when their last song is deleted.
///
/// The cascade mirrors the delete-signal behavior of the catalog layer; it is
/// an explicit policy choice rather than an implicit side effect so it can be
/// turned off and tested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrphanPolicy {
    /// Delete artists/albums that no longer have any songs.
    #[default]
    Cascade,
    /// Keep empty artists/albums around.
    Retain,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub server_port: u16,
    pub storage_backend: BackendKind,
    // S3 / S3-compatible object store
    pub s3_bucket: Option<String>,
    pub s3_region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO, Spaces, ...)
    pub s3_endpoint: Option<String>,
    /// Public-facing endpoint override; signed URLs pointing at the internal
    /// endpoint are rewritten to this one before being handed to clients.
    pub s3_public_endpoint: Option<String>,
    // Local filesystem backend
    pub local_storage_path: Option<String>,
    // Streaming
    pub stream_chunk_size: usize,
    pub signed_url_ttl_secs: u64,
    // Thumbnails
    pub thumbnail_max_width: u32,
    pub thumbnail_max_height: u32,
    // Retention
    pub orphan_policy: OrphanPolicy,
}

impl Config {
    /// Load configuration from the environment.
    ///
    /// `STORAGE_BACKEND` selects local or s3; everything else has a sensible
    /// default except the backend-specific settings, which are validated by
    /// the storage factory when the backend is constructed.
    pub fn from_env() -> anyhow::Result<Self> {
        let storage_backend = env::var("STORAGE_BACKEND")
            .unwrap_or_else(|_| "local".to_string())
            .parse::<BackendKind>()
            .map_err(|e| anyhow::anyhow!(e))?;

        let orphan_policy = match env::var("ORPHAN_POLICY").ok().as_deref() {
            Some("retain") => OrphanPolicy::Retain,
            _ => OrphanPolicy::Cascade,
        };

        Ok(Config {
            server_port: parse_env("SERVER_PORT", DEFAULT_SERVER_PORT)?,
            storage_backend,
            s3_bucket: env::var("S3_BUCKET").ok(),
            s3_region: env::var("S3_REGION")
                .or_else(|_| env::var("AWS_REGION"))
                .ok(),
            s3_endpoint: env::var("S3_ENDPOINT").ok(),
            s3_public_endpoint: env::var("S3_PUBLIC_ENDPOINT").ok(),
            local_storage_path: env::var("LOCAL_STORAGE_PATH").ok(),
            stream_chunk_size: parse_env("STREAM_CHUNK_SIZE", DEFAULT_STREAM_CHUNK_SIZE)?,
            signed_url_ttl_secs: parse_env("SIGNED_URL_TTL_SECS", DEFAULT_SIGNED_URL_TTL_SECS)?,
            thumbnail_max_width: parse_env("THUMBNAIL_MAX_WIDTH", DEFAULT_THUMBNAIL_MAX_DIM)?,
            thumbnail_max_height: parse_env("THUMBNAIL_MAX_HEIGHT", DEFAULT_THUMBNAIL_MAX_DIM)?,
            orphan_policy,
        })
    }

    /// Configuration suitable for tests and examples: local storage rooted at
    /// the given path, small chunk size so chunked reads are exercised.
    pub fn for_local_testing(base_path: impl Into<String>) -> Self {
        Config {
            server_port: 0,
            storage_backend: BackendKind::Local,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_public_endpoint: None,
            local_storage_path: Some(base_path.into()),
            stream_chunk_size: 1024,
            signed_url_ttl_secs: DEFAULT_SIGNED_URL_TTL_SECS,
            thumbnail_max_width: DEFAULT_THUMBNAIL_MAX_DIM,
            thumbnail_max_height: DEFAULT_THUMBNAIL_MAX_DIM,
            orphan_policy: OrphanPolicy::Cascade,
        }
    }
}

fn parse_env<T: FromStr>(name: &str, default: T) -> anyhow::Result<T> {
    match env::var(name) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|_| anyhow::anyhow!("invalid value for {}: {}", name, v)),
        Err(_) => Ok(default),
    }
}

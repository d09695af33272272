//! Range-aware delivery of committed media.
//!
//! Local storage is streamed through the server with HTTP range support.
//! Object storage is never proxied: the client gets a time-limited signed
//! URL and fetches the bytes directly from the store.

use axum::{
    body::Body,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use melora_core::catalog::SongSource;
use melora_core::{AppError, AppResult, BackendKind};
use melora_storage::Storage;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Body of the signed-URL response for object-store backends.
#[derive(Debug, Serialize)]
pub struct SignedUrlResponse {
    pub url: String,
    pub content_type: String,
    pub expires_at: DateTime<Utc>,
}

pub struct StreamingService {
    storage: Arc<dyn Storage>,
    signed_url_ttl: Duration,
}

impl StreamingService {
    pub fn new(storage: Arc<dyn Storage>, signed_url_ttl: Duration) -> Self {
        StreamingService {
            storage,
            signed_url_ttl,
        }
    }

    /// Serve one committed media object, honoring an optional `Range` header.
    pub async fn serve(
        &self,
        source: &SongSource,
        range_header: Option<&str>,
    ) -> AppResult<Response> {
        match self.storage.backend_kind() {
            BackendKind::S3 => self.serve_signed_url(source).await,
            BackendKind::Local => self.serve_stream(source, range_header).await,
        }
    }

    /// Object-store path: hand out a signed URL instead of proxying bytes.
    async fn serve_signed_url(&self, source: &SongSource) -> AppResult<Response> {
        let grant = self
            .storage
            .signed_url(&source.location, self.signed_url_ttl)
            .await?;

        tracing::debug!(
            location = %source.location,
            expires_at = %grant.expires_at,
            "Issued signed access URL"
        );

        let body = SignedUrlResponse {
            url: grant.url,
            content_type: source.mime_type.clone(),
            expires_at: grant.expires_at,
        };
        Ok(Json(body).into_response())
    }

    /// Local path: stream bytes through the server, with range support.
    async fn serve_stream(
        &self,
        source: &SongSource,
        range_header: Option<&str>,
    ) -> AppResult<Response> {
        let total = match self.storage.content_length(&source.location).await {
            Ok(len) => len,
            Err(melora_storage::StorageError::NotFound(_)) => {
                return Err(AppError::NotFound(format!(
                    "media object {} is missing from storage",
                    source.location
                )));
            }
            Err(e) => return Err(e.into()),
        };

        let Some(raw) = range_header else {
            return self.full_response(source, total).await;
        };

        // An unparseable or out-of-range request gets a 416 rather than a
        // silent full-body fallback. The error renderer keeps the body empty.
        let Some((start, end)) = parse_range(raw, total) else {
            return Err(AppError::RangeNotSatisfiable(raw.to_string()));
        };

        let length = end - start + 1;
        let stream = self
            .storage
            .read_range(&source.location, start, length)
            .await?;
        let body = Body::from_stream(stream.map(|chunk| chunk.map_err(std::io::Error::other)));

        tracing::debug!(
            location = %source.location,
            start,
            end,
            total,
            "Serving partial content"
        );

        let response = Response::builder()
            .status(StatusCode::PARTIAL_CONTENT)
            .header(header::CONTENT_TYPE, &source.mime_type)
            .header(header::CONTENT_LENGTH, length)
            .header(
                header::CONTENT_RANGE,
                format!("bytes {}-{}/{}", start, end, total),
            )
            .header(header::ACCEPT_RANGES, "bytes")
            .body(body)
            .map_err(|e| AppError::Internal(format!("failed to build response: {e}")))?;
        Ok(response)
    }

    async fn full_response(&self, source: &SongSource, total: u64) -> AppResult<Response> {
        let stream = self.storage.download_stream(&source.location).await?;
        let body = Body::from_stream(stream.map(|chunk| chunk.map_err(std::io::Error::other)));

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, &source.mime_type)
            .header(header::CONTENT_LENGTH, total)
            .header(header::ACCEPT_RANGES, "bytes")
            .body(body)
            .map_err(|e| AppError::Internal(format!("failed to build response: {e}")))?;
        Ok(response)
    }
}

/// Parse a `Range` header of the form `bytes=start-` or `bytes=start-end`
/// against an object of `total` bytes.
///
/// Returns the inclusive byte span to serve, with the end clamped to the
/// last byte. `None` means the request is malformed or the start lies at or
/// past the end of the object; both get a 416.
fn parse_range(header: &str, total: u64) -> Option<(u64, u64)> {
    if total == 0 {
        return None;
    }
    let spec = header.strip_prefix("bytes=")?;
    let (start_s, end_s) = spec.split_once('-')?;
    let start: u64 = start_s.parse().ok()?;
    if start >= total {
        return None;
    }
    let end = if end_s.is_empty() {
        total - 1
    } else {
        let requested: u64 = end_s.parse().ok()?;
        if requested < start {
            return None;
        }
        requested.min(total - 1)
    };
    Some((start, end))
}

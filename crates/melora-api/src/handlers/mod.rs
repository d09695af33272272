pub mod song_delete;
pub mod song_stream;
pub mod song_upload;

use crate::error::HttpAppError;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use melora_core::AppError;
use uuid::Uuid;

/// Identity of the uploading user, taken from the `X-Owner-Id` header.
///
/// Authentication proper lives in front of this service; the header carries
/// the already-verified principal.
#[derive(Debug, Clone, Copy)]
pub struct OwnerId(pub Uuid);

impl<S> FromRequestParts<S> for OwnerId
where
    S: Send + Sync,
{
    type Rejection = HttpAppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get("x-owner-id")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::InvalidInput("missing X-Owner-Id header".to_string()))?;
        let id = Uuid::parse_str(raw)
            .map_err(|_| AppError::InvalidInput("X-Owner-Id is not a valid UUID".to_string()))?;
        Ok(OwnerId(id))
    }
}

use crate::error::HttpAppError;
use crate::handlers::OwnerId;
use crate::state::AppState;
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use bytes::Bytes;
use melora_core::AppError;
use std::sync::Arc;

#[tracing::instrument(
    skip(state, multipart),
    fields(owner_id = %owner.0, operation = "upload_song")
)]
pub async fn upload_song(
    State(state): State<Arc<AppState>>,
    owner: OwnerId,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, HttpAppError> {
    let (filename, data) = read_file_field(&mut multipart).await?;

    let committed = state.pipeline.upload_song(data, &filename, owner.0).await?;

    Ok((StatusCode::CREATED, Json(committed)))
}

/// Pull the `file` part out of the multipart body.
async fn read_file_field(multipart: &mut Multipart) -> Result<(String, Bytes), HttpAppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidInput(format!("invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field
            .file_name()
            .map(str::to_owned)
            .ok_or_else(|| AppError::InvalidInput("file part has no filename".to_string()))?;
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::InvalidInput(format!("failed to read file part: {e}")))?;
        if data.is_empty() {
            return Err(AppError::InvalidInput("uploaded file is empty".to_string()).into());
        }
        return Ok((filename, data));
    }

    Err(AppError::InvalidInput("missing 'file' multipart field".to_string()).into())
}

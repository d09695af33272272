use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{header, HeaderMap},
    response::Response,
};
use melora_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(
    skip(state, headers),
    fields(song_id = %id, operation = "stream_song")
)]
pub async fn stream_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Response, HttpAppError> {
    let source = state
        .catalog
        .song_source(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("song {id} not found")))?;

    let range = headers
        .get(header::RANGE)
        .and_then(|v| v.to_str().ok());

    let response = state.streaming.serve(&source, range).await?;
    Ok(response)
}

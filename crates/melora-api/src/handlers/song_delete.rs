use crate::error::HttpAppError;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use melora_core::AppError;
use std::sync::Arc;
use uuid::Uuid;

#[tracing::instrument(skip(state), fields(song_id = %id, operation = "delete_song"))]
pub async fn delete_song(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HttpAppError> {
    let deleted = state
        .catalog
        .delete_song(id)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::NotFound(format!("song {id} not found")))?;

    // The record is gone; reclaim runs best-effort after the fact.
    state.retention.on_song_deleted(&deleted).await;

    tracing::info!(song_id = %id, "Deleted song");
    Ok(StatusCode::NO_CONTENT)
}

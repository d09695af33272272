//! Router assembly.

use crate::handlers::{song_delete, song_stream, song_upload};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Upper bound on a single upload body.
pub const MAX_UPLOAD_SIZE_BYTES: usize = 100 * 1024 * 1024;

pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/songs", post(song_upload::upload_song))
        .route("/api/songs/{id}/stream", get(song_stream::stream_song))
        .route(
            "/api/songs/{id}",
            axum::routing::delete(song_delete::delete_song),
        )
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

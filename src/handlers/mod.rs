//! HTTP surface: routes, shared state and multipart parsing.

pub mod detect;
pub mod health;
pub mod index;
pub mod upload;

use crate::error::AppError;
use crate::pipeline::{Pipeline, Upload};
use axum::extract::{DefaultBodyLimit, Multipart};
use axum::routing::{get, post};
use axum::Router;
use std::path::Path;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

pub struct AppState {
    pub pipeline: Pipeline,
}

pub fn router(state: Arc<AppState>, static_dir: &Path, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index::index))
        .route("/upload", post(upload::upload))
        .route("/api/detect", post(detect::detect))
        .route("/health", get(health::health))
        .nest_service("/static", ServeDir::new(static_dir))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Pull the `image` file field out of a multipart form.
///
/// `Ok(None)` means no file was provided: the field is absent, or the
/// browser sent it with an empty filename (nothing selected).
pub async fn read_image_field(mut multipart: Multipart) -> Result<Option<Upload>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }

        let filename = match field.file_name() {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => return Ok(None),
        };
        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read image: {e}")))?;

        return Ok(Some(Upload {
            filename,
            data: data.to_vec(),
        }));
    }

    Ok(None)
}

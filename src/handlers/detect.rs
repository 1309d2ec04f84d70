//! JSON detection endpoint: POST /api/detect

use super::{read_image_field, AppState};
use crate::error::AppError;
use crate::pipeline::RequestResult;
use axum::extract::{Multipart, State};
use axum::Json;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// POST /api/detect - same pipeline as the upload form, JSON in and out
pub async fn detect(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<DetectResponse>, AppError> {
    let start = Instant::now();

    let upload = read_image_field(multipart)
        .await?
        .ok_or_else(|| AppError::BadRequest("No image field in request".to_string()))?;

    let result = state.pipeline.analyze(upload).await?;

    Ok(Json(DetectResponse {
        result,
        elapsed_ms: start.elapsed().as_secs_f64() * 1000.0,
    }))
}

#[derive(Serialize)]
pub struct DetectResponse {
    #[serde(flatten)]
    pub result: RequestResult,
    pub elapsed_ms: f64,
}

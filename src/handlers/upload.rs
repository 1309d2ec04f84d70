//! Browser upload flow: POST /upload

use super::{read_image_field, AppState};
use crate::error::AppError;
use crate::views;
use axum::extract::multipart::MultipartRejection;
use axum::extract::{Multipart, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use std::sync::Arc;
use tracing::{error, info};

/// POST /upload - analyze one photo and render the result page.
///
/// A request without a file goes back to the form rather than erroring.
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let Ok(multipart) = multipart else {
        info!("Upload without multipart body, redirecting to form");
        return Redirect::to("/").into_response();
    };

    let upload = match read_image_field(multipart).await {
        Ok(Some(upload)) => upload,
        Ok(None) => {
            info!("No file provided, redirecting to form");
            return Redirect::to("/").into_response();
        }
        Err(e) => return error_response(e),
    };

    match state.pipeline.analyze(upload).await {
        Ok(result) => Html(views::result_page(&result)).into_response(),
        Err(e) => error_response(e),
    }
}

fn error_response(err: AppError) -> Response {
    let status = err.status();
    error!(status = status.as_u16(), "{err}");
    (status, Html(views::error_page(&err))).into_response()
}

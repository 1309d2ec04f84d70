//! Error types for the calorie estimation service.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    ImageDecode(String),
    Detector(String),
    Storage(String),
    BadRequest(String),
    Config(String),
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ImageDecode(_) => StatusCode::BAD_REQUEST,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Detector(_) => StatusCode::BAD_GATEWAY,
            AppError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message without the kind prefix, suitable for showing to the user.
    pub fn message(&self) -> &str {
        match self {
            AppError::ImageDecode(msg)
            | AppError::Detector(msg)
            | AppError::Storage(msg)
            | AppError::BadRequest(msg)
            | AppError::Config(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::ImageDecode(msg) => write!(f, "Image decode error: {msg}"),
            AppError::Detector(msg) => write!(f, "Detector error: {msg}"),
            AppError::Storage(msg) => write!(f, "Storage error: {msg}"),
            AppError::BadRequest(msg) => write!(f, "Bad request: {msg}"),
            AppError::Config(msg) => write!(f, "Configuration error: {msg}"),
            AppError::Internal(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(format!("IO error: {err}"))
    }
}

impl From<tonic::transport::Error> for AppError {
    fn from(err: tonic::transport::Error) -> Self {
        AppError::Detector(format!("Transport error: {err}"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(format!("Worker task failed: {err}"))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        error!(status = status.as_u16(), "{self}");

        let body = json!({
            "error": self.message(),
            "status": status.as_u16(),
        });

        (status, axum::Json(body)).into_response()
    }
}

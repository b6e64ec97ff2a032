//! API error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use herd_gemini::EnrichError;
use herd_vision::VisionError;
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("No image uploaded")]
    MissingInput,

    #[error("Invalid image file: {0}")]
    InvalidInput(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Image too large")]
    PayloadTooLarge,

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingInput | ApiError::InvalidInput(_) | ApiError::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::Inference(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether the caller caused the error.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl From<VisionError> for ApiError {
    fn from(err: VisionError) -> Self {
        match err {
            VisionError::InvalidImage(reason) => ApiError::InvalidInput(reason),
            other => ApiError::Inference(other.to_string()),
        }
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    detail: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Don't expose internal error details in production
        let detail = match &self {
            ApiError::Inference(_) | ApiError::Internal(_) => {
                if std::env::var("ENVIRONMENT").unwrap_or_default() == "production" {
                    "An internal error occurred".to_string()
                } else {
                    self.to_string()
                }
            }
            _ => self.to_string(),
        };

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

/// Startup failures. The service must not accept traffic after one of these.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Model registry unavailable: {0}")]
    Models(#[from] VisionError),

    #[error("Enrichment client unavailable: {0}")]
    Enrichment(#[from] EnrichError),
}

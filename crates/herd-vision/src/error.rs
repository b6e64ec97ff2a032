//! Error types for preprocessing and inference.

use thiserror::Error;

/// Result type for vision operations.
pub type VisionResult<T> = Result<T, VisionError>;

#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    ModelLoad(String),

    #[error("Inference failed: {0}")]
    Inference(String),
}

impl VisionError {
    pub fn invalid_image(message: impl Into<String>) -> Self {
        Self::InvalidImage(message.into())
    }

    pub fn model_not_found(path: impl Into<String>) -> Self {
        Self::ModelNotFound(path.into())
    }

    pub fn model_load(message: impl Into<String>) -> Self {
        Self::ModelLoad(message.into())
    }

    pub fn inference(message: impl Into<String>) -> Self {
        Self::Inference(message.into())
    }

    /// Whether the error was caused by the uploaded data rather than the service.
    pub fn is_client_error(&self) -> bool {
        matches!(self, VisionError::InvalidImage(_))
    }
}

//! Enrichment error types.

use std::time::Duration;

use thiserror::Error;

pub type EnrichResult<T> = Result<T, EnrichError>;

#[derive(Debug, Error)]
pub enum EnrichError {
    #[error("GEMINI_API_KEY not set")]
    MissingApiKey,

    /// Non-success HTTP status from Gemini.
    #[error("{status} - {body}")]
    Status { status: u16, body: String },

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl EnrichError {
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

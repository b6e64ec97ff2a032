//! Axum HTTP API for cow/buffalo breed prediction.
//!
//! This crate provides:
//! - The prediction orchestrator (preprocess -> cascade -> enrichment)
//! - `POST /predict` multipart upload endpoint
//! - Request IDs, security headers and request logging
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ConfigurationError};
pub use routes::create_router;
pub use services::PredictionService;
pub use state::AppState;

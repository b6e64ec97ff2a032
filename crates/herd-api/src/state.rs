//! Application state.

use std::sync::Arc;

use herd_gemini::{BreedSummarizer, GeminiClient};
use herd_vision::ModelRegistry;
use tracing::info;

use crate::config::ApiConfig;
use crate::error::ConfigurationError;
use crate::services::PredictionService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub predictor: Arc<PredictionService>,
}

impl AppState {
    /// Load the Gemini key and all three models. Any failure is fatal.
    pub fn new(config: ApiConfig) -> Result<Self, ConfigurationError> {
        let gemini = GeminiClient::from_env()?;
        let registry = ModelRegistry::load(&config.models)?;

        info!(
            inference_concurrency = config.inference_concurrency,
            "Application state initialized"
        );

        Ok(Self::from_parts(config, registry, Arc::new(gemini)))
    }

    /// Assemble state from already built parts.
    pub fn from_parts(
        config: ApiConfig,
        registry: ModelRegistry,
        summarizer: Arc<dyn BreedSummarizer>,
    ) -> Self {
        let predictor = PredictionService::new(
            Arc::new(registry),
            summarizer,
            config.inference_concurrency,
            config.enrichment_timeout,
        );

        Self {
            config,
            predictor: Arc::new(predictor),
        }
    }
}

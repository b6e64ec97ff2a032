//! Gemini HTTP client.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use herd_models::Breed;
use reqwest::Client;
use tracing::{debug, info};

use crate::error::{EnrichError, EnrichResult};
use crate::prompt::build_breed_prompt;
use crate::types::{GenerateRequest, GenerateResponse};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-1.5-flash";
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Produces a human-readable summary for a breed.
#[async_trait]
pub trait BreedSummarizer: Send + Sync {
    async fn summarize(&self, breed: Breed) -> EnrichResult<String>;
}

/// Configuration for the Gemini client.
#[derive(Clone)]
pub struct GeminiConfig {
    /// API key, sent as the `x-goog-api-key` header
    api_key: String,
    /// API base URL, without trailing slash
    pub base_url: String,
    /// Model name used in `models/{model}:generateContent`
    pub model: String,
    /// Request timeout
    pub timeout: Duration,
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl GeminiConfig {
    /// Config with default endpoint, model and timeout. The key must be non-empty.
    pub fn new(api_key: impl Into<String>) -> EnrichResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(EnrichError::MissingApiKey);
        }

        Ok(Self {
            api_key,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }

    /// Create config from environment variables. `GEMINI_API_KEY` is required.
    pub fn from_env() -> EnrichResult<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| EnrichError::MissingApiKey)?;
        let mut config = Self::new(api_key)?;

        if let Ok(base_url) = std::env::var("GEMINI_BASE_URL") {
            config = config.with_base_url(base_url);
        }
        if let Ok(model) = std::env::var("GEMINI_MODEL") {
            config.model = model;
        }
        config.timeout = Duration::from_secs(
            std::env::var("GEMINI_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_TIMEOUT_SECS),
        );

        Ok(config)
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

/// Gemini API client.
pub struct GeminiClient {
    http: Client,
    config: GeminiConfig,
}

impl GeminiClient {
    /// Create a new Gemini client.
    pub fn new(config: GeminiConfig) -> EnrichResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(EnrichError::Network)?;

        info!(model = %config.model, timeout_secs = config.timeout.as_secs(), "Gemini client ready");

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> EnrichResult<Self> {
        Self::new(GeminiConfig::from_env()?)
    }

    /// Send `prompt` and return the generated text.
    pub async fn generate(&self, prompt: &str) -> EnrichResult<String> {
        let url = self.config.endpoint();
        debug!(model = %self.config.model, "Sending Gemini request");

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(&GenerateRequest::from_prompt(prompt))
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.map_transport_error(e))?;

        if !status.is_success() {
            return Err(EnrichError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&body)
            .map_err(|e| EnrichError::invalid_response(format!("Failed to parse Gemini response: {}", e)))?;

        let text = parsed
            .first_text()
            .map(str::trim)
            .ok_or_else(|| EnrichError::invalid_response("No content in Gemini response"))?;

        if text.is_empty() {
            return Err(EnrichError::invalid_response("Gemini returned empty text"));
        }

        Ok(text.to_string())
    }

    fn map_transport_error(&self, error: reqwest::Error) -> EnrichError {
        if error.is_timeout() {
            EnrichError::Timeout(self.config.timeout)
        } else {
            // Strip the URL so request details never end up in summaries or logs.
            EnrichError::Network(error.without_url())
        }
    }
}

#[async_trait]
impl BreedSummarizer for GeminiClient {
    async fn summarize(&self, breed: Breed) -> EnrichResult<String> {
        self.generate(&build_breed_prompt(breed)).await
    }
}

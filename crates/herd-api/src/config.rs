//! API configuration.

use std::time::Duration;

use herd_vision::ModelPaths;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Request timeout
    pub request_timeout: Duration,
    /// Max request body size
    pub max_body_size: usize,
    /// Number of images classified concurrently
    pub inference_concurrency: usize,
    /// Upper bound on waiting for the breed summary
    pub enrichment_timeout: Duration,
    /// Model artifact locations
    pub models: ModelPaths,
    /// Environment (development/production)
    pub environment: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            cors_origins: vec!["*".to_string()],
            request_timeout: Duration::from_secs(60),
            max_body_size: 10 * 1024 * 1024, // 10MB
            inference_concurrency: 4,
            enrichment_timeout: Duration::from_secs(35),
            models: ModelPaths::default(),
            environment: "development".to_string(),
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            host: std::env::var("API_HOST").unwrap_or(defaults.host),
            port: env_parse("API_PORT").unwrap_or(defaults.port),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            request_timeout: env_parse("REQUEST_TIMEOUT")
                .map(Duration::from_secs)
                .unwrap_or(defaults.request_timeout),
            max_body_size: env_parse("MAX_BODY_SIZE").unwrap_or(defaults.max_body_size),
            inference_concurrency: env_parse::<usize>("INFERENCE_CONCURRENCY")
                .unwrap_or(defaults.inference_concurrency)
                .max(1),
            enrichment_timeout: env_parse("ENRICHMENT_TIMEOUT_SECS")
                .map(Duration::from_secs)
                .unwrap_or(defaults.enrichment_timeout),
            models: ModelPaths::from_env(),
            environment: std::env::var("ENVIRONMENT").unwrap_or(defaults.environment),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = ApiConfig::default();
        assert_eq!(config.port, 5000);
        assert_eq!(config.inference_concurrency, 4);
        assert_eq!(config.max_body_size, 10 * 1024 * 1024);
        assert!(!config.is_production());
    }
}

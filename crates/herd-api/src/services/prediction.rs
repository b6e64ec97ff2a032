//! Prediction orchestration: preprocess, classify, then enrich.

use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use herd_gemini::BreedSummarizer;
use herd_models::{ClassificationResult, PredictionResponse};
use herd_vision::{preprocess, CascadeClassifier, ModelRegistry};
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::{ApiError, ApiResult};
use crate::metrics;

/// Runs one prediction per uploaded image.
///
/// Decoding and model evaluation are CPU-bound and run on the blocking pool,
/// at most `inference_concurrency` at a time. The summary call runs on the
/// async runtime afterwards and does not hold an inference slot.
pub struct PredictionService {
    cascade: CascadeClassifier,
    summarizer: Arc<dyn BreedSummarizer>,
    inference_slots: Arc<Semaphore>,
    enrichment_timeout: Duration,
}

impl PredictionService {
    pub fn new(
        registry: Arc<ModelRegistry>,
        summarizer: Arc<dyn BreedSummarizer>,
        inference_concurrency: usize,
        enrichment_timeout: Duration,
    ) -> Self {
        Self {
            cascade: CascadeClassifier::new(registry),
            summarizer,
            inference_slots: Arc::new(Semaphore::new(inference_concurrency.max(1))),
            enrichment_timeout,
        }
    }

    /// Classify `image` and attach the breed summary.
    pub async fn handle(&self, image: Bytes) -> ApiResult<PredictionResponse> {
        if image.is_empty() {
            return Err(ApiError::MissingInput);
        }

        let size_bytes = image.len();
        let started = Instant::now();
        let result = self.classify(image).await?;
        let inference_secs = started.elapsed().as_secs_f64();
        metrics::record_prediction(result.species.as_str(), result.breed.as_str(), inference_secs);

        let summary = self.enrich(&result).await;

        info!(
            animal = %result.species,
            animal_confidence = result.species_score,
            breed = %result.breed,
            confidence = result.breed_confidence,
            size_bytes,
            inference_ms = (inference_secs * 1000.0) as u64,
            total_ms = started.elapsed().as_millis() as u64,
            "Prediction completed"
        );

        Ok(PredictionResponse::new(result, summary))
    }

    /// Inference slots currently free.
    pub fn available_inference_slots(&self) -> usize {
        self.inference_slots.available_permits()
    }

    async fn classify(&self, image: Bytes) -> ApiResult<ClassificationResult> {
        let permit = Arc::clone(&self.inference_slots)
            .acquire_owned()
            .await
            .map_err(|_| ApiError::internal("Inference pool closed"))?;
        let cascade = self.cascade.clone();

        // The permit moves into the task so the slot stays taken until the
        // blocking work ends, even if the request is dropped.
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let tensor = preprocess(&image)?;
            cascade.classify(&tensor)
        })
        .await
        .map_err(|e| ApiError::inference(format!("Inference task failed: {}", e)))?
        .map_err(ApiError::from)
    }

    /// Best-effort summary. Failures become `"Error: ..."` text.
    async fn enrich(&self, result: &ClassificationResult) -> String {
        let started = Instant::now();
        let outcome = tokio::time::timeout(self.enrichment_timeout, self.summarizer.summarize(result.breed)).await;
        let elapsed = started.elapsed().as_secs_f64();

        match outcome {
            Ok(Ok(summary)) => {
                metrics::record_enrichment("ok", elapsed);
                summary
            }
            Ok(Err(e)) => {
                warn!(breed = %result.breed, error = %e, "Breed summary unavailable");
                metrics::record_enrichment("error", elapsed);
                format!("Error: {}", e)
            }
            Err(_) => {
                warn!(
                    breed = %result.breed,
                    timeout_secs = self.enrichment_timeout.as_secs_f64(),
                    "Breed summary timed out"
                );
                metrics::record_enrichment("timeout", elapsed);
                format!("Error: enrichment timed out after {:?}", self.enrichment_timeout)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use herd_gemini::{EnrichError, EnrichResult};
    use herd_models::{Breed, Species};
    use herd_vision::{Classifier, ImageTensor, VisionError, VisionResult};
    use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb};
    use std::io::Cursor;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        output: Vec<f32>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(output: Vec<f32>) -> Arc<Self> {
            Arc::new(Self {
                output,
                calls: AtomicUsize::new(0),
            })
        }
    }

    impl Classifier for Fixed {
        fn predict(&self, _input: &ImageTensor) -> VisionResult<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.output.clone())
        }
    }

    struct Broken;

    impl Classifier for Broken {
        fn predict(&self, _input: &ImageTensor) -> VisionResult<Vec<f32>> {
            Err(VisionError::inference("input shape mismatch"))
        }
    }

    struct EchoSummarizer;

    #[async_trait]
    impl BreedSummarizer for EchoSummarizer {
        async fn summarize(&self, breed: Breed) -> EnrichResult<String> {
            Ok(format!("{} summary", breed))
        }
    }

    struct SlowSummarizer;

    #[async_trait]
    impl BreedSummarizer for SlowSummarizer {
        async fn summarize(&self, _breed: Breed) -> EnrichResult<String> {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok("too late".to_string())
        }
    }

    /// Returns a canned result regardless of breed.
    struct CannedSummarizer(fn() -> EnrichResult<String>);

    #[async_trait]
    impl BreedSummarizer for CannedSummarizer {
        async fn summarize(&self, _breed: Breed) -> EnrichResult<String> {
            (self.0)()
        }
    }

    fn cow_service(summarizer: CannedSummarizer) -> PredictionService {
        let registry = ModelRegistry::new(
            Fixed::new(vec![0.7]),
            Fixed::new(vec![0.1, 0.1, 0.6, 0.1, 0.1]),
            Fixed::new(vec![0.2; 5]),
        );
        PredictionService::new(Arc::new(registry), Arc::new(summarizer), 1, Duration::from_secs(5))
    }

    fn png() -> Bytes {
        let img = ImageBuffer::from_pixel(64, 48, Rgb([120u8, 90, 60]));
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(img)
            .write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)
            .unwrap();
        Bytes::from(bytes)
    }

    fn service(gate: Arc<Fixed>, cow: Arc<Fixed>, buffalo: Arc<Fixed>) -> PredictionService {
        let registry = ModelRegistry::new(gate, cow, buffalo);
        PredictionService::new(Arc::new(registry), Arc::new(EchoSummarizer), 2, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn test_buffalo_prediction() {
        let service = service(
            Fixed::new(vec![0.2]),
            Fixed::new(vec![0.2; 5]),
            Fixed::new(vec![0.1, 0.1, 0.6, 0.1, 0.1]),
        );

        let response = service.handle(png()).await.unwrap();

        assert_eq!(response.animal, Species::Buffalo);
        assert_eq!(response.breed, Breed::Nagpuri);
        assert_eq!(response.confidence, 0.6);
        assert_eq!(response.animal_confidence, 0.2);
        assert_eq!(response.summary, "Nagpuri summary");
        assert_eq!(service.available_inference_slots(), 2);
    }

    #[tokio::test]
    async fn test_empty_payload_skips_models() {
        let gate = Fixed::new(vec![0.9]);
        let service = service(gate.clone(), Fixed::new(vec![0.2; 5]), Fixed::new(vec![0.2; 5]));

        let err = service.handle(Bytes::new()).await.unwrap_err();

        assert!(matches!(err, ApiError::MissingInput));
        assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_undecodable_image_is_client_error() {
        let gate = Fixed::new(vec![0.9]);
        let service = service(gate.clone(), Fixed::new(vec![0.2; 5]), Fixed::new(vec![0.2; 5]));

        let err = service.handle(Bytes::from_static(b"GIF89a broken")).await.unwrap_err();

        assert!(matches!(err, ApiError::InvalidInput(_)));
        assert!(err.is_client_error());
        assert_eq!(gate.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_model_failure_is_server_error() {
        let registry = ModelRegistry::new(Arc::new(Broken), Fixed::new(vec![0.2; 5]), Fixed::new(vec![0.2; 5]));
        let service = PredictionService::new(
            Arc::new(registry),
            Arc::new(EchoSummarizer),
            1,
            Duration::from_secs(5),
        );

        let err = service.handle(png()).await.unwrap_err();

        assert!(matches!(err, ApiError::Inference(_)));
        assert!(!err.is_client_error());
    }

    #[tokio::test]
    async fn test_slow_enrichment_degrades_to_text() {
        let registry = ModelRegistry::new(
            Fixed::new(vec![0.8]),
            Fixed::new(vec![0.7, 0.1, 0.1, 0.05, 0.05]),
            Fixed::new(vec![0.2; 5]),
        );
        let service = PredictionService::new(
            Arc::new(registry),
            Arc::new(SlowSummarizer),
            1,
            Duration::from_millis(50),
        );

        let response = service.handle(png()).await.unwrap();

        assert_eq!(response.breed, Breed::Ayshire);
        assert!(response.summary.starts_with("Error: enrichment timed out"));
    }

    #[tokio::test]
    async fn test_enrichment_error_becomes_summary_text() {
        let service = cow_service(CannedSummarizer(|| {
            Err(EnrichError::Status {
                status: 502,
                body: "bad gateway".to_string(),
            })
        }));

        let response = service.handle(png()).await.unwrap();

        assert_eq!(response.breed, Breed::HolsteinFriesian);
        assert_eq!(response.summary, "Error: 502 - bad gateway");
    }

    #[tokio::test]
    async fn test_summary_text_is_passed_through() {
        // A successful summary may itself start with "Error"
        let service = cow_service(CannedSummarizer(|| Ok("Error-free milking: clean teats first".to_string())));

        let response = service.handle(png()).await.unwrap();

        assert_eq!(response.summary, "Error-free milking: clean teats first");
    }
}

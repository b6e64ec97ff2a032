//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Install the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "herd_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "herd_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "herd_http_requests_in_flight";

    // Prediction metrics
    pub const PREDICTIONS_TOTAL: &str = "herd_predictions_total";
    pub const INFERENCE_DURATION_SECONDS: &str = "herd_inference_duration_seconds";
    pub const ENRICHMENT_DURATION_SECONDS: &str = "herd_enrichment_duration_seconds";
    pub const ENRICHMENTS_TOTAL: &str = "herd_enrichments_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", path.to_string()),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a completed classification.
pub fn record_prediction(species: &str, breed: &str, inference_secs: f64) {
    let labels = [("species", species.to_string()), ("breed", breed.to_string())];
    counter!(names::PREDICTIONS_TOTAL, &labels).increment(1);
    histogram!(names::INFERENCE_DURATION_SECONDS).record(inference_secs);
}

/// Record a summary call, successful or not.
pub fn record_enrichment(outcome: &'static str, duration_secs: f64) {
    histogram!(names::ENRICHMENT_DURATION_SECONDS).record(duration_secs);
    counter!(names::ENRICHMENTS_TOTAL, "outcome" => outcome).increment(1);
}

/// Route template for labels; unmatched paths collapse to one value.
fn route_label(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string())
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = route_label(&request);
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

//! API middleware.

use std::time::{Duration, Instant};

use axum::body::Body;
use axum::extract::MatchedPath;
use axum::http::{header, HeaderValue, Method, Request, Response};
use axum::middleware::Next;
use tower_http::cors::{Any, CorsLayer};
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Header carrying the request correlation ID.
pub const REQUEST_ID_HEADER: &str = "X-Request-ID";

/// Longest caller-supplied request ID that is reused.
const MAX_REQUEST_ID_LEN: usize = 64;

/// CORS for the browser upload form. `*` allows any origin.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
        .expose_headers([header::HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(600));

    if origins.iter().any(|o| o == "*") {
        cors.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse().ok()).collect();
        cors.allow_origin(origins)
    }
}

/// Response headers for a JSON-only API. Predictions are never cacheable.
pub async fn security_headers(request: Request<Body>, next: Next) -> Response<Body> {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();

    headers.insert(header::X_CONTENT_TYPE_OPTIONS, HeaderValue::from_static("nosniff"));
    headers.insert(header::X_FRAME_OPTIONS, HeaderValue::from_static("DENY"));
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));

    response
}

/// Reuse the caller's request ID when it is short printable ASCII, else mint one.
fn resolve_request_id(request: &Request<Body>) -> String {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|id| !id.is_empty() && id.len() <= MAX_REQUEST_ID_LEN)
        .filter(|id| id.bytes().all(|b| b.is_ascii_graphic()))
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Runs the request inside a span tagged with its ID, echoes the ID back and
/// logs the outcome.
///
/// Health probes and scrapes log at debug so they do not drown out predictions.
pub async fn request_context(request: Request<Body>, next: Next) -> Response<Body> {
    let request_id = resolve_request_id(&request);
    let method = request.method().clone();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| request.uri().path().to_string());

    let span = info_span!("request", request_id = %request_id, method = %method, route = %route);
    let started = Instant::now();

    let mut response = next.run(request).instrument(span.clone()).await;

    let status = response.status();
    let duration_ms = started.elapsed().as_millis() as u64;
    span.in_scope(|| {
        if status.is_server_error() {
            warn!(status = status.as_u16(), duration_ms, "Request failed");
        } else if route == "/predict" {
            info!(status = status.as_u16(), duration_ms, "Request completed");
        } else {
            debug!(status = status.as_u16(), duration_ms, "Request completed");
        }
    });

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

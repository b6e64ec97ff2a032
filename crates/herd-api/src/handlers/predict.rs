//! Image prediction handler.

use axum::extract::multipart::{Multipart, MultipartError, MultipartRejection};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use bytes::Bytes;
use herd_models::PredictionResponse;
use tracing::debug;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Multipart field carrying the uploaded photo.
pub const IMAGE_FIELD: &str = "image";

/// Classify an uploaded cow/buffalo photo.
///
/// Expects `multipart/form-data` with the photo in the `image` field.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Json<PredictionResponse>> {
    let mut multipart = multipart.map_err(|e| {
        debug!(error = %e, "Request is not a multipart upload");
        ApiError::MissingInput
    })?;

    let image = read_image_field(&mut multipart)
        .await?
        .ok_or(ApiError::MissingInput)?;

    let response = state.predictor.handle(image).await?;
    Ok(Json(response))
}

/// Return the bytes of the first `image` field, skipping any other fields.
async fn read_image_field(multipart: &mut Multipart) -> ApiResult<Option<Bytes>> {
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        if field.name() == Some(IMAGE_FIELD) {
            let bytes = field.bytes().await.map_err(multipart_error)?;
            return Ok(Some(bytes));
        }
    }
    Ok(None)
}

fn multipart_error(err: MultipartError) -> ApiError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge
    } else {
        ApiError::bad_request(err.body_text())
    }
}

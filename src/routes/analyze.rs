use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use base64::Engine;
use garde::Validate;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::models::analysis::{AnalyzeRequest, AnalyzeResponse, AnalysisStatusResponse};
use crate::routes::{api_error, ErrorResponse};

type ApiError = (StatusCode, Json<ErrorResponse>);

/// POST /api/v1/analyze — Start a vision analysis of a face photo.
///
/// Creation is non-blocking: the vision provider's inference can take far
/// longer than a request should be held open, so the response carries a
/// prediction id for the caller to poll.
pub async fn start_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    check_image_data_uri(&request.image)?;

    metrics::counter!("vision_analyses_total").increment(1);

    let started = state.vision.start_analysis(&request.image).await.map_err(|e| {
        warn!(error = %e, "failed to start vision analysis");
        api_error(StatusCode::BAD_GATEWAY, "failed to start analysis")
    })?;

    info!(prediction_id = %started.prediction_id, "vision analysis started");

    Ok(Json(AnalyzeResponse {
        prediction_id: started.prediction_id,
        status: started.status,
    }))
}

/// GET /api/v1/analyze/{prediction_id} — Check vision analysis status.
pub async fn get_analysis_status(
    State(state): State<AppState>,
    Path(prediction_id): Path<String>,
) -> Result<Json<AnalysisStatusResponse>, ApiError> {
    let report = state.vision.check_analysis(&prediction_id).await.map_err(|e| {
        warn!(prediction_id = %prediction_id, error = %e, "failed to check analysis");
        api_error(StatusCode::BAD_GATEWAY, "failed to check analysis status")
    })?;

    Ok(Json(AnalysisStatusResponse {
        status: report.status,
        analysis: report.analysis,
        error: report.error,
        duration_ms: None,
    }))
}

/// POST /api/v1/analyze/sync — Direct analysis fallback.
///
/// Blocks until the prediction finishes, bounded by a short server-side
/// poll budget. Used by callers whose create-then-poll path failed.
pub async fn sync_analysis(
    State(state): State<AppState>,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalysisStatusResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    check_image_data_uri(&request.image)?;

    metrics::counter!("vision_analyses_total").increment(1);

    let started = std::time::Instant::now();
    let report = state.vision.run_analysis(&request.image).await.map_err(|e| {
        warn!(error = %e, "direct analysis failed");
        api_error(StatusCode::BAD_GATEWAY, "analysis failed")
    })?;

    Ok(Json(AnalysisStatusResponse {
        status: report.status,
        analysis: report.analysis,
        error: report.error,
        duration_ms: Some(started.elapsed().as_millis() as i64),
    }))
}

/// Caller-boundary image check: must be an image data URI whose payload
/// decodes to a recognizable image format.
fn check_image_data_uri(image: &str) -> Result<(), ApiError> {
    if !image.starts_with("data:image/") {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            "image must be a data URI with an image MIME type",
        ));
    }

    let payload = image
        .split_once(";base64,")
        .map(|(_, payload)| payload)
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "image data URI must be base64-encoded"))?;

    let bytes = base64::engine::general_purpose::STANDARD
        .decode(payload)
        .map_err(|_| api_error(StatusCode::BAD_REQUEST, "invalid base64 image payload"))?;

    // Validate image format using the `image` crate
    image::guess_format(&bytes)
        .map_err(|_| api_error(StatusCode::UNSUPPORTED_MEDIA_TYPE, "unrecognized image format"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Smallest valid PNG: 8-byte signature is enough for format sniffing.
    fn png_data_uri() -> String {
        let payload =
            base64::engine::general_purpose::STANDARD.encode(b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0d");
        format!("data:image/png;base64,{payload}")
    }

    #[test]
    fn test_valid_png_data_uri_accepted() {
        assert!(check_image_data_uri(&png_data_uri()).is_ok());
    }

    #[test]
    fn test_non_data_uri_rejected() {
        let err = check_image_data_uri("https://example.com/face.png").unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_non_image_mime_rejected() {
        let err = check_image_data_uri("data:text/plain;base64,aGVsbG8=").unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_bad_base64_rejected() {
        let err = check_image_data_uri("data:image/png;base64,!!!not-base64!!!").unwrap_err();
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_undecodable_image_bytes_rejected() {
        let payload = base64::engine::general_purpose::STANDARD.encode(b"definitely not an image");
        let uri = format!("data:image/png;base64,{payload}");
        let err = check_image_data_uri(&uri).unwrap_err();
        assert_eq!(err.0, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    }
}

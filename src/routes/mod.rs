pub mod analyze;
pub mod health;
pub mod interpret;
pub mod metrics;

use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

/// Error body returned by every API endpoint on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) fn api_error(
    status: StatusCode,
    message: impl Into<String>,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

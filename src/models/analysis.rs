use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Status of a vision analysis prediction at the external provider.
///
/// `ValidationFailed` is not a provider state: it is derived from a
/// succeeded output carrying the face-validation sentinel, and is
/// terminal just like `Succeeded` and `Failed`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AnalysisStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    ValidationFailed,
}

impl AnalysisStatus {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            AnalysisStatus::Succeeded | AnalysisStatus::Failed | AnalysisStatus::ValidationFailed
        )
    }
}

/// Request to start a vision analysis of a face photo.
#[derive(Debug, Deserialize, Validate)]
pub struct AnalyzeRequest {
    /// Base64 data URI of the image (`data:image/...;base64,...`).
    #[garde(length(min = 1))]
    pub image: String,
}

/// Response after starting a vision analysis.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub prediction_id: String,
    pub status: AnalysisStatus,
}

/// Response for querying vision analysis status.
#[derive(Debug, Serialize, Deserialize)]
pub struct AnalysisStatusResponse {
    pub status: AnalysisStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
}

//! Replicate LLaVA client (vision stage).
//!
//! Predictions are created in non-blocking mode: full vision inference can
//! outlast a request handler's execution budget, so creation returns a
//! prediction id immediately and status is polled separately by the caller.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use crate::models::analysis::AnalysisStatus;

const REPLICATE_API_BASE: &str = "https://api.replicate.com/v1";

/// LLaVA v1.5 13B model version pinned for face analysis.
const LLAVA_VERSION: &str = "b5f6212d032508382d61ff00469ddda3e32fd8a0e75dc39d8a4191bb742157fb";

/// A succeeded output starting with this marker means the image failed
/// face validation: a semantic result, not a provider failure. The
/// convention is a free-text prefix rather than a structured field; it is
/// what the vision prompt instructs and what downstream callers key on.
pub const VALIDATION_SENTINEL: &str = "VALIDATION_FAILED:";

/// Poll cadence and budget for the synchronous fallback path.
const BLOCKING_POLL_INTERVAL: Duration = Duration::from_secs(1);
const BLOCKING_POLL_ATTEMPTS: u32 = 9;

/// Instruction prompt enumerating the ten facial regions of classical
/// physiognomy, plus the validation escape hatch.
const FACE_ANALYSIS_PROMPT: &str = "\
You are an expert in classical Islamic physiognomy (Ilmu Firasat / علم الفراسة).
Analyze this face image with the precision of a traditional Kitab Firasat scholar.

FIRST, validate the image. If it does not show exactly one clear human face
(an animal, a cartoon or illustration, a blurry image, no face, or multiple
faces), respond with exactly one line:
VALIDATION_FAILED: <short reason>

Otherwise, describe each region with precision. CRITICAL: provide UNIQUE,
DETAILED descriptions. Do NOT use generic phrases.

1. FOREHEAD (الجبهة - Jabhah): height, width, shape, surface, temples, brow ridge.
2. EYEBROWS (الحواجب - Al-Hawajib): thickness, shape, length, spacing, position, texture, tail.
3. EYES (العينان - Al-'Aynayn): size, shape, set, depth, eyelids, corners, gaze, expression.
4. NOSE (الأنف - Al-Anf): length, bridge, tip shape and size, nostrils, root, overall type.
5. LIPS & MOUTH (الفم والشفتان): fullness of each lip, ratio, cupid's bow, width, corners, philtrum.
6. JAWLINE & CHIN (الذقن والفك): jawline shape and definition, jaw width and angle, chin shape and projection.
7. CHEEKBONES (الخد - Al-Khadd): prominence, height, definition, hollows, fullness, symmetry.
8. EARS (الأذنان - Al-Udzun): size, position, protrusion, shape, lobe, visibility.
9. FACE SHAPE (الوجه - Al-Wajh): primary shape, proportions, length vs width, symmetry, angularity.
10. HAIRLINE (الشعر - Al-Sha'r): presence, shape, height, corners, density, texture and color if visible.

OUTPUT: Number each section 1-10. Be SPECIFIC. Describe EXACTLY what you observe.
Keep tone neutral. This is for Kitab Firasat character analysis.";

/// A freshly created prediction.
#[derive(Debug, Clone)]
pub struct StartedAnalysis {
    pub prediction_id: String,
    pub status: AnalysisStatus,
}

/// Snapshot of a prediction's progress, after sentinel reinterpretation.
#[derive(Debug, Clone)]
pub struct AnalysisReport {
    pub status: AnalysisStatus,
    pub analysis: Option<String>,
    pub error: Option<String>,
}

#[derive(Deserialize)]
struct PredictionResponse {
    id: String,
    status: String,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

/// Client for the Replicate predictions API.
pub struct ReplicateClient {
    http: Client,
    api_token: String,
}

impl ReplicateClient {
    pub fn new(api_token: &str) -> Result<Self, VisionError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(VisionError::Http)?;
        Ok(Self {
            http,
            api_token: api_token.to_string(),
        })
    }

    /// Create a face analysis prediction and return immediately.
    ///
    /// Provider rejection (bad credentials, malformed input) propagates as
    /// an error; retrying is the caller's business, not this layer's.
    pub async fn start_analysis(&self, image_data_uri: &str) -> Result<StartedAnalysis, VisionError> {
        let body = json!({
            "version": LLAVA_VERSION,
            "input": {
                "image": image_data_uri,
                "prompt": FACE_ANALYSIS_PROMPT,
                "max_tokens": 2048,
                "temperature": 0.4,
                "top_p": 0.95,
            }
        });

        let response = self
            .http
            .post(format!("{REPLICATE_API_BASE}/predictions"))
            .bearer_auth(&self.api_token)
            .json(&body)
            .send()
            .await
            .map_err(VisionError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let prediction: PredictionResponse = response.json().await.map_err(VisionError::Http)?;
        Ok(StartedAnalysis {
            status: map_provider_status(&prediction.status),
            prediction_id: prediction.id,
        })
    }

    /// Check a prediction by id. No local retry; callers poll.
    pub async fn check_analysis(&self, prediction_id: &str) -> Result<AnalysisReport, VisionError> {
        let response = self
            .http
            .get(format!("{REPLICATE_API_BASE}/predictions/{prediction_id}"))
            .bearer_auth(&self.api_token)
            .send()
            .await
            .map_err(VisionError::Http)?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(VisionError::Api {
                status: status.as_u16(),
                detail,
            });
        }

        let prediction: PredictionResponse = response.json().await.map_err(VisionError::Http)?;
        Ok(report_from_prediction(prediction))
    }

    /// Synchronous fallback: create a prediction and wait for it inline,
    /// bounded by a short poll budget. The async create-then-poll path is
    /// strictly better when it works; this exists for callers whose primary
    /// path failed.
    pub async fn run_analysis(&self, image_data_uri: &str) -> Result<AnalysisReport, VisionError> {
        let started = self.start_analysis(image_data_uri).await?;

        for _ in 0..BLOCKING_POLL_ATTEMPTS {
            tokio::time::sleep(BLOCKING_POLL_INTERVAL).await;
            let report = self.check_analysis(&started.prediction_id).await?;
            if report.status.is_terminal() {
                return Ok(report);
            }
        }

        Err(VisionError::Timeout)
    }
}

fn map_provider_status(status: &str) -> AnalysisStatus {
    match status {
        "starting" => AnalysisStatus::Starting,
        "succeeded" => AnalysisStatus::Succeeded,
        "failed" | "canceled" => AnalysisStatus::Failed,
        _ => AnalysisStatus::Processing,
    }
}

/// Join provider-native output (string or array of strings) and apply the
/// validation sentinel rule.
fn report_from_prediction(prediction: PredictionResponse) -> AnalysisReport {
    let status = map_provider_status(&prediction.status);

    if status != AnalysisStatus::Succeeded {
        return AnalysisReport {
            status,
            analysis: None,
            error: prediction.error,
        };
    }

    let analysis = join_output(prediction.output.as_ref());

    if let Some(reason) = analysis.strip_prefix(VALIDATION_SENTINEL) {
        return AnalysisReport {
            status: AnalysisStatus::ValidationFailed,
            analysis: None,
            error: Some(reason.trim().to_string()),
        };
    }

    AnalysisReport {
        status: AnalysisStatus::Succeeded,
        analysis: Some(analysis),
        error: None,
    }
}

fn join_output(output: Option<&serde_json::Value>) -> String {
    match output {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Array(parts)) => parts
            .iter()
            .map(|p| p.as_str().unwrap_or_default())
            .collect(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum VisionError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Vision provider returned status {status}: {detail}")]
    Api { status: u16, detail: String },

    #[error("Vision analysis did not finish within the blocking poll budget")]
    Timeout,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn prediction(status: &str, output: serde_json::Value) -> PredictionResponse {
        PredictionResponse {
            id: "pred_123".to_string(),
            status: status.to_string(),
            output: Some(output),
            error: None,
        }
    }

    #[test]
    fn test_sentinel_reinterpreted_as_validation_failed() {
        let report = report_from_prediction(prediction(
            "succeeded",
            json!("VALIDATION_FAILED: appears to be an animal"),
        ));
        assert_eq!(report.status, AnalysisStatus::ValidationFailed);
        assert_eq!(report.error.as_deref(), Some("appears to be an animal"));
        assert!(report.analysis.is_none());
    }

    #[test]
    fn test_succeeded_string_output() {
        let report =
            report_from_prediction(prediction("succeeded", json!("1. FOREHEAD: high and broad")));
        assert_eq!(report.status, AnalysisStatus::Succeeded);
        assert_eq!(report.analysis.as_deref(), Some("1. FOREHEAD: high and broad"));
    }

    #[test]
    fn test_array_output_joined_without_separator() {
        let report = report_from_prediction(prediction(
            "succeeded",
            json!(["1. FOREHEAD: ", "high and ", "broad"]),
        ));
        assert_eq!(report.analysis.as_deref(), Some("1. FOREHEAD: high and broad"));
    }

    #[test]
    fn test_sentinel_split_across_array_chunks() {
        let report = report_from_prediction(prediction(
            "succeeded",
            json!(["VALIDATION_", "FAILED: no human face detected"]),
        ));
        assert_eq!(report.status, AnalysisStatus::ValidationFailed);
        assert_eq!(report.error.as_deref(), Some("no human face detected"));
    }

    #[test]
    fn test_provider_failure_carries_error_text() {
        let report = report_from_prediction(PredictionResponse {
            id: "pred_123".to_string(),
            status: "failed".to_string(),
            output: None,
            error: Some("CUDA out of memory".to_string()),
        });
        assert_eq!(report.status, AnalysisStatus::Failed);
        assert_eq!(report.error.as_deref(), Some("CUDA out of memory"));
    }

    #[test]
    fn test_unknown_status_treated_as_processing() {
        let report = report_from_prediction(prediction("queued", json!(null)));
        assert_eq!(report.status, AnalysisStatus::Processing);
    }
}

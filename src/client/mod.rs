//! Calling-side pipeline driver.
//!
//! Drives the full photo-to-narrative flow over HTTP: start vision
//! analysis, poll until terminal, start interpretation, poll until
//! terminal. Each stage falls back to a simpler synchronous single-call
//! path when the primary asynchronous path fails.

pub mod poller;

use std::time::Duration;

use reqwest::StatusCode;
use serde_json::json;
use tracing::warn;

use crate::models::analysis::{AnalysisStatus, AnalysisStatusResponse, AnalyzeResponse};
use crate::models::interpretation::{
    InterpretAccepted, InterpretMode, InterpretStatusResponse, Language, StoredResult,
};
use crate::models::job::JobStatus;
use self::poller::{poll_until_terminal, Check, PollConfig, PollOutcome};

const DEFAULT_POLL_ATTEMPTS: u32 = 60;
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// HTTP client for the firasah API.
pub struct PipelineClient {
    http: reqwest::Client,
    base_url: String,
    vision_poll: PollConfig,
    interpret_poll: PollConfig,
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The image is not a usable human-face photo. Terminal: retried only
    /// with a different image, never automatically.
    #[error("image failed face validation: {reason}")]
    ValidationFailed { reason: String },

    #[error("vision analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("vision analysis timed out after polling budget was exhausted")]
    AnalysisTimeout,

    #[error("interpretation failed: {0}")]
    InterpretationFailed(String),

    #[error("interpretation timed out after polling budget was exhausted")]
    InterpretationTimeout,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} returned unexpected status {status}")]
    UnexpectedStatus {
        endpoint: &'static str,
        status: u16,
    },
}

impl PipelineClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            vision_poll: PollConfig::new(
                DEFAULT_POLL_ATTEMPTS,
                DEFAULT_POLL_INTERVAL,
                "analyzing facial features...",
            ),
            interpret_poll: PollConfig::new(
                DEFAULT_POLL_ATTEMPTS,
                DEFAULT_POLL_INTERVAL,
                "interpreting character...",
            ),
        }
    }

    /// Full pipeline: image data URI → interpreted character narrative.
    pub async fn read_face(
        &self,
        image_data_uri: &str,
        language: Language,
        mode: InterpretMode,
    ) -> Result<StoredResult, PipelineError> {
        let analysis = self.analyze(image_data_uri).await?;
        self.interpret(&analysis, language, mode).await
    }

    /// Vision stage with fallback. Validation failure is terminal and is
    /// never retried through the fallback path.
    pub async fn analyze(&self, image_data_uri: &str) -> Result<String, PipelineError> {
        match self.analyze_async(image_data_uri).await {
            Ok(analysis) => Ok(analysis),
            Err(e @ PipelineError::ValidationFailed { .. }) => Err(e),
            Err(primary) => {
                warn!(error = %primary, "async analysis path failed, trying direct path");
                self.analyze_sync(image_data_uri).await
            }
        }
    }

    /// Interpretation stage with fallback to the synchronous endpoint.
    pub async fn interpret(
        &self,
        analysis: &str,
        language: Language,
        mode: InterpretMode,
    ) -> Result<StoredResult, PipelineError> {
        match self.interpret_async(analysis, language, mode).await {
            Ok(result) => Ok(result),
            Err(primary) => {
                warn!(error = %primary, "async interpretation path failed, trying sync path");
                self.interpret_sync(analysis, language, mode).await
            }
        }
    }

    async fn analyze_async(&self, image_data_uri: &str) -> Result<String, PipelineError> {
        let response = self
            .http
            .post(format!("{}/api/v1/analyze", self.base_url))
            .json(&json!({ "image": image_data_uri }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                endpoint: "analyze",
                status: response.status().as_u16(),
            });
        }

        let started: AnalyzeResponse = response.json().await?;

        let outcome = poll_until_terminal(self.vision_poll, || {
            self.check_analysis(&started.prediction_id)
        })
        .await;

        match outcome {
            PollOutcome::Terminal(report) => vision_terminal(report),
            PollOutcome::TimedOut => Err(PipelineError::AnalysisTimeout),
        }
    }

    async fn check_analysis(
        &self,
        prediction_id: &str,
    ) -> Result<Check<AnalysisStatusResponse>, PipelineError> {
        let response = self
            .http
            .get(format!("{}/api/v1/analyze/{}", self.base_url, prediction_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                endpoint: "analyze status",
                status: response.status().as_u16(),
            });
        }

        let report: AnalysisStatusResponse = response.json().await?;
        Ok(if report.status.is_terminal() {
            Check::Terminal(report)
        } else {
            Check::Pending
        })
    }

    async fn analyze_sync(&self, image_data_uri: &str) -> Result<String, PipelineError> {
        let response = self
            .http
            .post(format!("{}/api/v1/analyze/sync", self.base_url))
            .json(&json!({ "image": image_data_uri }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                endpoint: "analyze sync",
                status: response.status().as_u16(),
            });
        }

        let report: AnalysisStatusResponse = response.json().await?;
        vision_terminal(report)
    }

    async fn interpret_async(
        &self,
        analysis: &str,
        language: Language,
        mode: InterpretMode,
    ) -> Result<StoredResult, PipelineError> {
        let response = self
            .http
            .post(format!("{}/api/v1/interpret", self.base_url))
            .json(&json!({ "analysis": analysis, "language": language, "mode": mode }))
            .send()
            .await?;

        // Fire-and-forget acceptance; anything but 202 means the primary
        // path is unavailable.
        if response.status() != StatusCode::ACCEPTED {
            return Err(PipelineError::UnexpectedStatus {
                endpoint: "interpret",
                status: response.status().as_u16(),
            });
        }

        let accepted: InterpretAccepted = response.json().await?;

        let outcome = poll_until_terminal(self.interpret_poll, || {
            self.check_interpretation(&accepted.job_id)
        })
        .await;

        match outcome {
            PollOutcome::Terminal(status) => interpretation_terminal(status),
            PollOutcome::TimedOut => Err(PipelineError::InterpretationTimeout),
        }
    }

    async fn check_interpretation(
        &self,
        job_id: &str,
    ) -> Result<Check<InterpretStatusResponse>, PipelineError> {
        let response = self
            .http
            .get(format!("{}/api/v1/interpret/{}", self.base_url, job_id))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                endpoint: "interpret status",
                status: response.status().as_u16(),
            });
        }

        let status: InterpretStatusResponse = response.json().await?;
        Ok(if status.status.is_terminal() {
            Check::Terminal(status)
        } else {
            Check::Pending
        })
    }

    async fn interpret_sync(
        &self,
        analysis: &str,
        language: Language,
        mode: InterpretMode,
    ) -> Result<StoredResult, PipelineError> {
        let response = self
            .http
            .post(format!("{}/api/v1/interpret/sync", self.base_url))
            .json(&json!({ "analysis": analysis, "language": language, "mode": mode }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(PipelineError::UnexpectedStatus {
                endpoint: "interpret sync",
                status: response.status().as_u16(),
            });
        }

        let status: InterpretStatusResponse = response.json().await?;
        interpretation_terminal(status)
    }
}

/// Classify a terminal vision report. Validation failure short-circuits
/// the whole pipeline: the interpretation stage is never reached.
fn vision_terminal(report: AnalysisStatusResponse) -> Result<String, PipelineError> {
    match report.status {
        AnalysisStatus::Succeeded => Ok(report.analysis.unwrap_or_default()),
        AnalysisStatus::ValidationFailed => Err(PipelineError::ValidationFailed {
            reason: report
                .error
                .unwrap_or_else(|| "image is not a valid human face".to_string()),
        }),
        _ => Err(PipelineError::AnalysisFailed(
            report.error.unwrap_or_else(|| "analysis failed".to_string()),
        )),
    }
}

fn interpretation_terminal(
    status: InterpretStatusResponse,
) -> Result<StoredResult, PipelineError> {
    match status.status {
        JobStatus::Completed => {
            let result = status.result.ok_or_else(|| {
                PipelineError::InterpretationFailed("completed job carried no result".to_string())
            })?;
            serde_json::from_value(result).map_err(|e| {
                PipelineError::InterpretationFailed(format!("malformed result payload: {e}"))
            })
        }
        _ => Err(PipelineError::InterpretationFailed(
            status.error.unwrap_or_else(|| "interpretation failed".to_string()),
        )),
    }
}

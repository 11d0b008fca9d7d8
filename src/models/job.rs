use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::models::interpretation::{InterpretMode, Language};

/// Status of an interpretation job in the async pipeline.
///
/// `Completed` and `Failed` are terminal; exactly one transition out of
/// `Processing` ever happens, written by the worker that owns the job.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobStatus {
    Processing,
    Completed,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// A persisted character interpretation job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterpretationJob {
    pub job_id: String,
    pub status: JobStatus,
    pub language: Language,
    pub mode: InterpretMode,
    pub result: Option<serde_json::Value>,
    pub provider: Option<String>,
    pub duration_ms: Option<i64>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Generate a caller-style job identifier: `frs_<unix millis>_<6 alphanumerics>`.
///
/// The server mints one in this format when a client starts an
/// interpretation without supplying its own id.
pub fn new_job_id() -> String {
    const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
    let mut rng = rand::thread_rng();
    let suffix: String = (0..6)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("frs_{}_{}", Utc::now().timestamp_millis(), suffix)
}

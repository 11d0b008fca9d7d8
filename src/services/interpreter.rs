//! Interpretation orchestrator.
//!
//! Drives one interpretation from vision narrative to terminal job state:
//! digest, prompt, provider fallback chain, transform, persist. The async
//! worker path and the synchronous fallback endpoint share the same inner
//! pipeline; only the persistence differs.

use std::time::Instant;

use chrono::Utc;
use sqlx::PgPool;
use tracing::{error, info, warn};

use crate::models::interpretation::{InterpretMode, KitabSource, Language, StoredResult};
use crate::services::features::extract_features;
use crate::services::prompt::build_prompt;
use crate::services::providers::{ProviderClient, ProviderKind};
use crate::services::queue::QueuedInterpretation;
use crate::services::transform::transform;

/// A successful interpretation with the backend that produced it.
#[derive(Debug, Clone)]
pub struct InterpretationOutcome {
    pub stored: StoredResult,
    pub provider: ProviderKind,
}

#[derive(Debug, thiserror::Error)]
pub enum InterpretError {
    #[error("All AI providers failed")]
    AllProvidersFailed,
}

/// Run the provider fallback chain once, with no persistence.
///
/// Providers are tried strictly in sequence (parallel calls would spend
/// tokens on results that get discarded) and the first parseable JSON
/// object wins. Individual provider errors are logged and swallowed; only
/// exhausting the whole rotation surfaces as an error.
pub async fn interpret_once(
    providers: &ProviderClient,
    analysis: &str,
    language: Language,
    mode: InterpretMode,
) -> Result<InterpretationOutcome, InterpretError> {
    let digest = extract_features(analysis);
    let prompt = build_prompt(&digest, language, mode);

    let order = providers.provider_order(Utc::now().timestamp() as u64);
    if order.is_empty() {
        warn!("no interpretation providers configured");
        return Err(InterpretError::AllProvidersFailed);
    }

    for kind in order {
        match providers.call(kind, &prompt).await {
            Ok(raw) => {
                info!(provider = %kind, "provider produced a parseable result");
                let stored = StoredResult {
                    interpretation: transform(&raw, language),
                    source: KitabSource::default(),
                    lang_config: language.config(),
                };
                return Ok(InterpretationOutcome {
                    stored,
                    provider: kind,
                });
            }
            Err(e) => {
                warn!(provider = %kind, error = %e, "provider failed, trying next");
            }
        }
    }

    Err(InterpretError::AllProvidersFailed)
}

/// Worker entry point: interpret a queued request and move its job row to
/// a terminal state.
///
/// Exactly one terminal write happens per job. Whatever goes wrong inside
/// the pipeline is recorded as a failed status; a job must never be left
/// in `processing` because an error escaped.
pub async fn run_interpretation(
    pool: &PgPool,
    providers: &ProviderClient,
    job: &QueuedInterpretation,
) {
    let started = Instant::now();

    info!(
        job_id = %job.job_id,
        language = %job.language,
        mode = %job.mode,
        "processing interpretation job"
    );

    let outcome = interpret_once(providers, &job.analysis, job.language, job.mode).await;
    let duration_ms = started.elapsed().as_millis() as i64;

    match outcome {
        Ok(InterpretationOutcome { stored, provider }) => {
            metrics::counter!("interpretation_jobs_completed").increment(1);
            metrics::histogram!("interpretation_duration_seconds")
                .record(duration_ms as f64 / 1000.0);

            match serde_json::to_value(&stored) {
                Ok(result_json) => {
                    complete_with_retry(pool, &job.job_id, &result_json, provider, duration_ms)
                        .await;
                    info!(
                        job_id = %job.job_id,
                        provider = %provider,
                        duration_ms,
                        "interpretation completed"
                    );
                }
                Err(e) => {
                    // Serialization of our own types failing is a bug, but
                    // the job still must reach a terminal state.
                    error!(job_id = %job.job_id, error = %e, "result serialization failed");
                    fail_with_retry(pool, &job.job_id, &e.to_string(), duration_ms).await;
                }
            }
        }
        Err(e) => {
            metrics::counter!("interpretation_jobs_failed").increment(1);
            warn!(job_id = %job.job_id, duration_ms, "all providers failed");
            fail_with_retry(pool, &job.job_id, &e.to_string(), duration_ms).await;
        }
    }
}

/// Persist the completed status, retrying once. The status = 'processing'
/// guard in the query makes a retry after an ambiguous first attempt safe.
async fn complete_with_retry(
    pool: &PgPool,
    job_id: &str,
    result: &serde_json::Value,
    provider: ProviderKind,
    duration_ms: i64,
) {
    let provider = provider.to_string();
    for attempt in 0..2 {
        match crate::db::queries::complete_job(pool, job_id, result, &provider, duration_ms).await {
            Ok(true) => return,
            Ok(false) => {
                warn!(job_id, "job was no longer in processing state; result discarded");
                return;
            }
            Err(e) if attempt == 0 => {
                warn!(job_id, error = %e, "terminal status write failed, retrying");
            }
            Err(e) => {
                error!(job_id, error = %e, "terminal status write failed; job may appear stuck");
            }
        }
    }
}

/// Persist the failed status, retrying once.
async fn fail_with_retry(pool: &PgPool, job_id: &str, error_text: &str, duration_ms: i64) {
    for attempt in 0..2 {
        match crate::db::queries::fail_job(pool, job_id, error_text, duration_ms).await {
            Ok(true) => return,
            Ok(false) => {
                warn!(job_id, "job was no longer in processing state");
                return;
            }
            Err(e) if attempt == 0 => {
                warn!(job_id, error = %e, "failure status write failed, retrying");
            }
            Err(e) => {
                error!(job_id, error = %e, "failure status write failed; job may appear stuck");
            }
        }
    }
}

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::db::queries;
use crate::models::interpretation::{InterpretAccepted, InterpretRequest, InterpretStatusResponse};
use crate::models::job::{new_job_id, JobStatus};
use crate::routes::{api_error, ErrorResponse};
use crate::services::interpreter::{self, InterpretationOutcome};
use crate::services::queue::QueuedInterpretation;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// POST /api/v1/interpret — Accept an interpretation request.
///
/// Fire-and-forget: the job row is created in `processing` state so
/// polling can begin immediately, the request is queued for a worker, and
/// a 202 with the job id is all the caller gets.
pub async fn start_interpretation(
    State(state): State<AppState>,
    Json(request): Json<InterpretRequest>,
) -> Result<(StatusCode, Json<InterpretAccepted>), ApiError> {
    request
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let job_id = request.job_id.clone().unwrap_or_else(new_job_id);

    queries::create_job(&state.db, &job_id, request.language, request.mode)
        .await
        .map_err(|e| {
            warn!(job_id = %job_id, error = %e, "failed to create interpretation job");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to create job")
        })?;

    let queued = QueuedInterpretation {
        job_id: job_id.clone(),
        analysis: request.analysis,
        language: request.language,
        mode: request.mode,
    };

    if let Err(e) = state.queue.enqueue(&queued).await {
        // A row with no queued work would sit in processing forever; fail
        // it now so pollers see a terminal state.
        warn!(job_id = %job_id, error = %e, "failed to enqueue interpretation");
        if let Err(db_err) = queries::fail_job(&state.db, &job_id, "failed to enqueue job", 0).await
        {
            warn!(job_id = %job_id, error = %db_err, "could not record enqueue failure");
        }
        return Err(api_error(
            StatusCode::SERVICE_UNAVAILABLE,
            "interpretation queue unavailable",
        ));
    }

    metrics::counter!("interpretation_jobs_total").increment(1);
    info!(job_id = %job_id, language = %request.language, mode = %request.mode, "interpretation accepted");

    Ok((
        StatusCode::ACCEPTED,
        Json(InterpretAccepted {
            job_id,
            status: JobStatus::Processing,
        }),
    ))
}

/// GET /api/v1/interpret/{job_id} — Check interpretation job status.
pub async fn get_interpretation_status(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<Json<InterpretStatusResponse>, ApiError> {
    let job = queries::get_job(&state.db, &job_id)
        .await
        .map_err(|e| {
            warn!(job_id = %job_id, error = %e, "failed to read job");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "failed to read job")
        })?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "job not found"))?;

    Ok(Json(InterpretStatusResponse {
        job_id: job.job_id,
        status: job.status,
        result: job.result,
        provider: job.provider,
        duration_ms: job.duration_ms,
        error: job.error,
    }))
}

/// POST /api/v1/interpret/sync — Synchronous interpretation fallback.
///
/// Shares the digest/prompt/provider/transform pipeline with the worker
/// path but skips queue and persistence entirely; the full result comes
/// back inline.
pub async fn sync_interpretation(
    State(state): State<AppState>,
    Json(request): Json<InterpretRequest>,
) -> Result<Json<InterpretStatusResponse>, ApiError> {
    request
        .validate()
        .map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let job_id = request.job_id.clone().unwrap_or_else(new_job_id);
    let started = std::time::Instant::now();

    let InterpretationOutcome { stored, provider } =
        interpreter::interpret_once(&state.providers, &request.analysis, request.language, request.mode)
            .await
            .map_err(|e| api_error(StatusCode::BAD_GATEWAY, e.to_string()))?;

    let result = serde_json::to_value(&stored).map_err(|e| {
        api_error(StatusCode::INTERNAL_SERVER_ERROR, format!("result serialization failed: {e}"))
    })?;

    Ok(Json(InterpretStatusResponse {
        job_id,
        status: JobStatus::Completed,
        result: Some(result),
        provider: Some(provider.to_string()),
        duration_ms: Some(started.elapsed().as_millis() as i64),
        error: None,
    }))
}

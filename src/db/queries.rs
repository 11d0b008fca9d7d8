use sqlx::{PgPool, Row};

use crate::models::interpretation::{InterpretMode, Language};
use crate::models::job::{InterpretationJob, JobStatus};

fn job_from_row(row: &sqlx::postgres::PgRow) -> Result<InterpretationJob, sqlx::Error> {
    let status: String = row.try_get("status")?;
    let language: String = row.try_get("language")?;
    let mode: String = row.try_get("mode")?;

    Ok(InterpretationJob {
        job_id: row.try_get("job_id")?,
        status: status.parse().unwrap_or(JobStatus::Processing),
        language: language.parse().unwrap_or_default(),
        mode: mode.parse().unwrap_or_default(),
        result: row.try_get("result")?,
        provider: row.try_get("provider")?,
        duration_ms: row.try_get("duration_ms")?,
        error: row.try_get("error")?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

/// Insert a new interpretation job in `processing` state.
pub async fn create_job(
    pool: &PgPool,
    job_id: &str,
    language: Language,
    mode: InterpretMode,
) -> Result<InterpretationJob, sqlx::Error> {
    let row = sqlx::query(
        r#"
        INSERT INTO firasah_jobs (job_id, status, language, mode)
        VALUES ($1, 'processing', $2, $3)
        RETURNING job_id, status, language, mode, result, provider, duration_ms, error,
                  created_at, completed_at
        "#,
    )
    .bind(job_id)
    .bind(language.to_string())
    .bind(mode.to_string())
    .fetch_one(pool)
    .await?;

    job_from_row(&row)
}

/// Get a job by ID
pub async fn get_job(pool: &PgPool, job_id: &str) -> Result<Option<InterpretationJob>, sqlx::Error> {
    let row = sqlx::query(
        r#"
        SELECT job_id, status, language, mode, result, provider, duration_ms, error,
               created_at, completed_at
        FROM firasah_jobs
        WHERE job_id = $1
        "#,
    )
    .bind(job_id)
    .fetch_optional(pool)
    .await?;

    row.as_ref().map(job_from_row).transpose()
}

/// Mark a job completed with its result payload.
///
/// The `status = 'processing'` guard makes the terminal write at-most-once:
/// a duplicate worker matches zero rows instead of clobbering the result.
/// Returns whether this call performed the transition.
pub async fn complete_job(
    pool: &PgPool,
    job_id: &str,
    result: &serde_json::Value,
    provider: &str,
    duration_ms: i64,
) -> Result<bool, sqlx::Error> {
    let outcome = sqlx::query(
        r#"
        UPDATE firasah_jobs
        SET status = 'completed',
            result = $1,
            provider = $2,
            duration_ms = $3,
            completed_at = NOW()
        WHERE job_id = $4 AND status = 'processing'
        "#,
    )
    .bind(result)
    .bind(provider)
    .bind(duration_ms)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(outcome.rows_affected() > 0)
}

/// Mark a job failed, with the same at-most-once guard as [`complete_job`].
pub async fn fail_job(
    pool: &PgPool,
    job_id: &str,
    error: &str,
    duration_ms: i64,
) -> Result<bool, sqlx::Error> {
    let outcome = sqlx::query(
        r#"
        UPDATE firasah_jobs
        SET status = 'failed',
            error = $1,
            duration_ms = $2,
            completed_at = NOW()
        WHERE job_id = $3 AND status = 'processing'
        "#,
    )
    .bind(error)
    .bind(duration_ms)
    .bind(job_id)
    .execute(pool)
    .await?;

    Ok(outcome.rows_affected() > 0)
}

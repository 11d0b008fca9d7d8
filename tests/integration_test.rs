use firasah::{
    config::AppConfig,
    db::{self, queries},
    models::interpretation::{InterpretMode, Language},
    models::job::{new_job_id, JobStatus},
    services::queue::{JobQueue, QueuedInterpretation},
};

mod fixtures;
use fixtures::*;

/// Integration test: job store and queue flow
///
/// This test verifies the persistence half of the pipeline:
/// 1. Database connection and schema
/// 2. Job creation in processing state
/// 3. Guarded terminal transitions (at-most-once)
/// 4. Queue round-trip (enqueue/dequeue/complete)
///
/// Note: This requires a running PostgreSQL and Redis instance
/// configured via environment variables.
#[tokio::test]
#[ignore] // Run with: cargo test --test integration_test -- --ignored
async fn test_job_store_and_queue() {
    // Load config from environment
    let config = AppConfig::from_env().expect("Failed to load config");

    // Initialize database
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run migrations");

    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize queue");

    // 1. Create a job and read it back
    let job_id = new_job_id();
    let job = queries::create_job(&db_pool, &job_id, Language::My, InterpretMode::Summary)
        .await
        .expect("Failed to create job");

    assert_eq!(job.status, JobStatus::Processing);
    assert_eq!(job.job_id, job_id);
    assert!(job.result.is_none());
    assert!(job.completed_at.is_none());

    let retrieved = queries::get_job(&db_pool, &job_id)
        .await
        .expect("Failed to get job")
        .expect("Job not found");

    assert_eq!(retrieved.job_id, job_id);
    assert_eq!(retrieved.status, JobStatus::Processing);
    assert_eq!(retrieved.language, Language::My);
    assert_eq!(retrieved.mode, InterpretMode::Summary);

    // 2. Complete the job; the guard must report the transition happened
    let result = stub_summary_response();
    let transitioned = queries::complete_job(&db_pool, &job_id, &result, "gemini", 1234)
        .await
        .expect("Failed to complete job");
    assert!(transitioned);

    let completed = queries::get_job(&db_pool, &job_id)
        .await
        .expect("Failed to get job")
        .expect("Job not found");
    assert_eq!(completed.status, JobStatus::Completed);
    assert_eq!(completed.provider.as_deref(), Some("gemini"));
    assert_eq!(completed.duration_ms, Some(1234));
    assert!(completed.result.is_some());
    assert!(completed.completed_at.is_some());

    // 3. A second terminal write must be rejected by the guard
    let second = queries::complete_job(&db_pool, &job_id, &result, "openai", 99)
        .await
        .expect("Guarded update failed");
    assert!(!second, "duplicate terminal write must match zero rows");

    let failed_late = queries::fail_job(&db_pool, &job_id, "late failure", 0)
        .await
        .expect("Guarded update failed");
    assert!(!failed_late);

    let unchanged = queries::get_job(&db_pool, &job_id)
        .await
        .expect("Failed to get job")
        .expect("Job not found");
    assert_eq!(unchanged.provider.as_deref(), Some("gemini"));
    assert!(unchanged.error.is_none());

    // 4. Failure path on a fresh job
    let failed_id = new_job_id();
    queries::create_job(&db_pool, &failed_id, Language::En, InterpretMode::Detailed)
        .await
        .expect("Failed to create job");
    let failed = queries::fail_job(&db_pool, &failed_id, "All AI providers failed", 456)
        .await
        .expect("Failed to fail job");
    assert!(failed);

    let failed_job = queries::get_job(&db_pool, &failed_id)
        .await
        .expect("Failed to get job")
        .expect("Job not found");
    assert_eq!(failed_job.status, JobStatus::Failed);
    assert_eq!(failed_job.error.as_deref(), Some("All AI providers failed"));
    assert!(failed_job.result.is_none());

    // 5. Queue round-trip
    let queued = QueuedInterpretation {
        job_id: new_job_id(),
        analysis: SAMPLE_NARRATIVE.to_string(),
        language: Language::My,
        mode: InterpretMode::Summary,
    };

    queue.enqueue(&queued).await.expect("Failed to enqueue");

    let dequeued = queue
        .dequeue()
        .await
        .expect("Failed to dequeue")
        .expect("No job in queue");

    assert_eq!(dequeued.job_id, queued.job_id);
    assert_eq!(dequeued.analysis, queued.analysis);
    assert_eq!(dequeued.language, Language::My);

    queue.complete(&dequeued).await.expect("Failed to complete");

    println!("✓ Job store and queue integration passed");
}

/// Unknown job ids read back as None, never as an error.
#[tokio::test]
#[ignore]
async fn test_unknown_job_id_reads_as_none() {
    let config = AppConfig::from_env().expect("Failed to load config");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    let missing = queries::get_job(&db_pool, "frs_0_nosuch")
        .await
        .expect("Query failed");
    assert!(missing.is_none());
}

use firasah::{
    config::AppConfig,
    db,
    services::{interpreter, providers::ProviderClient, queue::JobQueue},
};
use std::time::Duration;
use tokio::time::sleep;
use tracing_subscriber::EnvFilter;

const POLL_INTERVAL_MS: u64 = 1000; // 1 second

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    tracing::info!("Starting firasah interpretation worker");

    // Load configuration
    let config = AppConfig::from_env().expect("Failed to load configuration");

    // Initialize database
    tracing::info!("Connecting to PostgreSQL");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Initialize services
    tracing::info!("Initializing services");
    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize job queue");

    let providers =
        ProviderClient::from_config(&config).expect("Failed to initialize provider client");
    if providers.available().is_empty() {
        tracing::warn!("no interpretation providers configured; every job will fail");
    }

    tracing::info!("Worker ready, starting job processing loop");

    // Main processing loop
    loop {
        match process_next_job(&db_pool, &queue, &providers).await {
            Ok(true) => {
                // Job processed, check for the next one immediately
                tracing::debug!("Job processed, checking for next job");
            }
            Ok(false) => {
                // No job available, sleep before next poll
                tracing::trace!("No jobs available, sleeping");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Error pulling job from queue, will retry");
                sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
            }
        }
    }
}

/// Process the next interpretation request from the queue.
/// Returns Ok(true) if a job was processed, Ok(false) if no job available.
async fn process_next_job(
    db_pool: &sqlx::PgPool,
    queue: &JobQueue,
    providers: &ProviderClient,
) -> Result<bool, Box<dyn std::error::Error>> {
    let job = match queue.dequeue().await? {
        Some(j) => j,
        None => return Ok(false), // No job available
    };

    if let Ok(depth) = queue.queue_depth().await {
        metrics::gauge!("interpretation_queue_depth").set(depth as f64);
    }

    // The orchestrator owns the terminal write; whatever happens inside,
    // the job row ends up completed or failed, so the queue entry is done.
    interpreter::run_interpretation(db_pool, providers, &job).await;

    queue.complete(&job).await?;

    Ok(true)
}

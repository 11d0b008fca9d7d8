mod app_state;
mod config;
mod db;
mod models;
mod routes;
mod services;

use axum::response::Html;
use axum::{routing::get, routing::post, Router};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::sync::Arc;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use app_state::AppState;
use config::AppConfig;
use services::{providers::ProviderClient, queue::JobQueue, vision::ReplicateClient};

#[tokio::main]
async fn main() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .json()
        .init();

    // Load configuration from environment
    let config = AppConfig::from_env().expect("Failed to load configuration from environment");

    tracing::info!("Initializing firasah server");

    // Initialize Prometheus metrics recorder
    let prometheus_handle = PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus metrics recorder");
    let prometheus_handle = Arc::new(prometheus_handle);

    // Register application metrics
    metrics::describe_counter!("vision_analyses_total", "Total vision analyses started");
    metrics::describe_counter!(
        "interpretation_jobs_total",
        "Total interpretation jobs accepted"
    );
    metrics::describe_counter!(
        "interpretation_jobs_completed",
        "Total interpretation jobs completed"
    );
    metrics::describe_counter!(
        "interpretation_jobs_failed",
        "Total interpretation jobs that failed"
    );
    metrics::describe_histogram!(
        "interpretation_duration_seconds",
        "Time from dequeue to terminal state for an interpretation job"
    );
    metrics::describe_gauge!(
        "interpretation_queue_depth",
        "Current number of accepted jobs waiting in the queue"
    );

    // Initialize database connection pool
    tracing::info!("Connecting to PostgreSQL database");
    let db_pool = db::init_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");

    // Run database migrations
    tracing::info!("Running database migrations");
    db::run_migrations(&db_pool)
        .await
        .expect("Failed to run database migrations");

    // Initialize Redis job queue
    tracing::info!("Connecting to Redis job queue");
    let queue = JobQueue::new(&config.redis_url).expect("Failed to initialize job queue");

    // Initialize the vision client
    tracing::info!("Initializing Replicate vision client");
    let vision = ReplicateClient::new(&config.replicate_api_token)
        .expect("Failed to initialize Replicate client");

    // Initialize interpretation providers
    let providers =
        ProviderClient::from_config(&config).expect("Failed to initialize provider client");
    let available = providers.available();
    if available.is_empty() {
        tracing::warn!("no interpretation providers configured; interpretation jobs will fail");
    } else {
        tracing::info!(providers = ?available, "interpretation providers configured");
    }

    // Create shared application state
    let state = AppState::new(db_pool, queue, vision, providers);

    // Build API routes
    let app = Router::new()
        // Static UI (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../static/index.html")) }))
        // API endpoints
        .route("/health", get(routes::health::health_check))
        .route("/api/v1/analyze", post(routes::analyze::start_analysis))
        .route("/api/v1/analyze/sync", post(routes::analyze::sync_analysis))
        .route(
            "/api/v1/analyze/{prediction_id}",
            get(routes::analyze::get_analysis_status),
        )
        .route(
            "/api/v1/interpret",
            post(routes::interpret::start_interpretation),
        )
        .route(
            "/api/v1/interpret/sync",
            post(routes::interpret::sync_interpretation),
        )
        .route(
            "/api/v1/interpret/{job_id}",
            get(routes::interpret::get_interpretation_status),
        )
        .with_state(state)
        // Prometheus metrics endpoint (separate state)
        .route(
            "/metrics",
            get(routes::metrics::prometheus_metrics).with_state(prometheus_handle),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024)); // 10 MB limit

    tracing::info!("Starting firasah on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .expect("Failed to bind to address");

    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app)
        .await
        .expect("Server error");
}

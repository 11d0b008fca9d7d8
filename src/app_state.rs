use sqlx::PgPool;
use std::sync::Arc;

use crate::services::{providers::ProviderClient, queue::JobQueue, vision::ReplicateClient};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub queue: Arc<JobQueue>,
    pub vision: Arc<ReplicateClient>,
    pub providers: Arc<ProviderClient>,
}

impl AppState {
    pub fn new(
        db: PgPool,
        queue: JobQueue,
        vision: ReplicateClient,
        providers: ProviderClient,
    ) -> Self {
        Self {
            db,
            queue: Arc::new(queue),
            vision: Arc::new(vision),
            providers: Arc::new(providers),
        }
    }
}

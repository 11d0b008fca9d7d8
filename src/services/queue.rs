use redis::AsyncCommands;
use serde::{Deserialize, Serialize};

use crate::models::interpretation::{InterpretMode, Language};

const QUEUE_KEY: &str = "firasah:interpret";
const PROCESSING_KEY: &str = "firasah:interpret:processing";

/// Accepted interpretation request serialized into Redis.
///
/// Carries everything the worker needs; the job row itself only holds
/// status and outcome.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueuedInterpretation {
    pub job_id: String,
    pub analysis: String,
    pub language: Language,
    pub mode: InterpretMode,
}

/// Redis-backed queue of accepted interpretation requests.
pub struct JobQueue {
    client: redis::Client,
}

impl JobQueue {
    pub fn new(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(QueueError::Redis)?;
        Ok(Self { client })
    }

    /// Enqueue an accepted interpretation request.
    pub async fn enqueue(&self, job: &QueuedInterpretation) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let payload = serde_json::to_string(job).map_err(QueueError::Serialize)?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, &payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Dequeue a request for processing (pop with move to processing list).
    pub async fn dequeue(&self) -> Result<Option<QueuedInterpretation>, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let result: Option<String> = conn
            .rpoplpush(QUEUE_KEY, PROCESSING_KEY)
            .await
            .map_err(QueueError::Redis)?;

        match result {
            Some(payload) => {
                let job = serde_json::from_str(&payload).map_err(QueueError::Serialize)?;
                Ok(Some(job))
            }
            None => Ok(None),
        }
    }

    /// Remove a processed request from the processing list.
    pub async fn complete(&self, job: &QueuedInterpretation) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let payload = serde_json::to_string(job).map_err(QueueError::Serialize)?;
        conn.lrem::<_, _, ()>(PROCESSING_KEY, 1, &payload)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Check Redis connectivity (for health checks).
    pub async fn health_check(&self) -> Result<(), QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        redis::cmd("PING")
            .query_async::<String>(&mut conn)
            .await
            .map_err(QueueError::Redis)?;
        Ok(())
    }

    /// Current queue depth (accepted jobs not yet picked up).
    pub async fn queue_depth(&self) -> Result<u64, QueueError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(QueueError::Redis)?;
        let depth: u64 = conn.llen(QUEUE_KEY).await.map_err(QueueError::Redis)?;
        Ok(depth)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

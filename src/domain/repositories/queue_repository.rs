use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::entities::{ChunkQueueItem, QueueStatus};

#[derive(Debug)]
pub enum QueueRepositoryError {
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for QueueRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueueRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            QueueRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for QueueRepositoryError {}

#[async_trait]
pub trait QueueRepository: Send + Sync {
    async fn enqueue_batch(
        &self,
        items: &[ChunkQueueItem],
    ) -> Result<usize, QueueRepositoryError>;

    /// Atomically claim up to `limit` pending items for the manual, flipping
    /// them to `processing`. Two concurrent callers must never receive
    /// overlapping sets; this is the one operation that has to be a single
    /// database-level claim, not a read-then-write.
    async fn lock_batch(
        &self,
        manual_id: &str,
        limit: i64,
    ) -> Result<Vec<ChunkQueueItem>, QueueRepositoryError>;

    async fn mark_done(&self, item_id: Uuid) -> Result<(), QueueRepositoryError>;

    async fn mark_failed(&self, item_id: Uuid, error: &str) -> Result<(), QueueRepositoryError>;

    async fn count_by_status(
        &self,
        manual_id: &str,
        status: QueueStatus,
    ) -> Result<i64, QueueRepositoryError>;

    /// Flip failed items back to pending for an explicit re-drive. Returns
    /// how many were requeued.
    async fn requeue_failed(&self, manual_id: &str) -> Result<i64, QueueRepositoryError>;

    async fn delete_by_manual(&self, manual_id: &str) -> Result<i64, QueueRepositoryError>;
}

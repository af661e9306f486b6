use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Text};
use uuid::Uuid;

use crate::domain::entities::{ChunkQueueItem, QueueStatus};
use crate::domain::repositories::{QueueRepository, queue_repository::QueueRepositoryError};
use crate::infrastructure::database::models::{ChunkQueueModel, NewChunkQueueModel};
use crate::infrastructure::database::schema::manual_chunk_queue::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

/// The claim must be a single database-level statement so that concurrent
/// workers never receive overlapping batches. SKIP LOCKED lets a second
/// worker step past rows a first worker is already claiming.
const LOCK_BATCH_SQL: &str = "\
    UPDATE manual_chunk_queue SET status = 'processing' \
    WHERE id IN ( \
        SELECT id FROM manual_chunk_queue \
        WHERE manual_id = $1 AND status = 'pending' \
        ORDER BY chunk_index \
        LIMIT $2 \
        FOR UPDATE SKIP LOCKED \
    ) \
    RETURNING *";

pub struct PostgresQueueRepository {
    pool: DbPool,
}

impl PostgresQueueRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueueRepository for PostgresQueueRepository {
    async fn enqueue_batch(
        &self,
        items: &[ChunkQueueItem],
    ) -> Result<usize, QueueRepositoryError> {
        if items.is_empty() {
            return Ok(0);
        }

        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        let new_items: Vec<NewChunkQueueModel> =
            items.iter().map(NewChunkQueueModel::from).collect();

        diesel::insert_into(manual_chunk_queue)
            .values(&new_items)
            .execute(&mut conn)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))
    }

    async fn lock_batch(
        &self,
        manual_id_param: &str,
        limit: i64,
    ) -> Result<Vec<ChunkQueueItem>, QueueRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        let rows = diesel::sql_query(LOCK_BATCH_SQL)
            .bind::<Text, _>(manual_id_param)
            .bind::<BigInt, _>(limit)
            .load::<ChunkQueueModel>(&mut conn)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(ChunkQueueItem::from).collect())
    }

    async fn mark_done(&self, item_id: Uuid) -> Result<(), QueueRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        diesel::update(manual_chunk_queue.find(item_id))
            .set((
                status.eq(QueueStatus::Done.as_str()),
                error_message.eq::<Option<String>>(None),
            ))
            .execute(&mut conn)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn mark_failed(&self, item_id: Uuid, error: &str) -> Result<(), QueueRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        diesel::update(manual_chunk_queue.find(item_id))
            .set((
                status.eq(QueueStatus::Failed.as_str()),
                retry_count.eq(retry_count + 1),
                error_message.eq(error),
            ))
            .execute(&mut conn)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn count_by_status(
        &self,
        manual_id_param: &str,
        status_param: QueueStatus,
    ) -> Result<i64, QueueRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        manual_chunk_queue
            .filter(manual_id.eq(manual_id_param))
            .filter(status.eq(status_param.as_str()))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))
    }

    async fn requeue_failed(&self, manual_id_param: &str) -> Result<i64, QueueRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        // Retry counters survive the flip so repeated failures stay visible.
        let requeued = diesel::update(
            manual_chunk_queue
                .filter(manual_id.eq(manual_id_param))
                .filter(status.eq(QueueStatus::Failed.as_str())),
        )
        .set((
            status.eq(QueueStatus::Pending.as_str()),
            error_message.eq::<Option<String>>(None),
        ))
        .execute(&mut conn)
        .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        Ok(requeued as i64)
    }

    async fn delete_by_manual(&self, manual_id_param: &str) -> Result<i64, QueueRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        let deleted = diesel::delete(manual_chunk_queue.filter(manual_id.eq(manual_id_param)))
            .execute(&mut conn)
            .map_err(|e| QueueRepositoryError::DatabaseError(e.to_string()))?;

        Ok(deleted as i64)
    }
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::{ChunkQueueItem, QueueStatus};
use crate::infrastructure::database::schema::manual_chunk_queue;

/// QueryableByName because the batch claim comes back from a raw
/// `UPDATE ... RETURNING *`.
#[derive(Debug, Clone, Queryable, Selectable, Identifiable, QueryableByName)]
#[diesel(table_name = manual_chunk_queue)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkQueueModel {
    pub id: Uuid,
    pub chunk_id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub content: String,
    pub chunk_index: i32,
    pub token_count: Option<i32>,
    pub content_hash: String,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub status: String,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = manual_chunk_queue)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChunkQueueModel {
    pub id: Uuid,
    pub chunk_id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub content: String,
    pub chunk_index: i32,
    pub token_count: Option<i32>,
    pub content_hash: String,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub status: String,
    pub retry_count: i32,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&ChunkQueueItem> for NewChunkQueueModel {
    fn from(item: &ChunkQueueItem) -> Self {
        Self {
            id: item.id(),
            chunk_id: item.chunk_id(),
            manual_id: item.manual_id().to_string(),
            tenant_id: item.tenant_id().to_string(),
            content: item.content().to_string(),
            chunk_index: item.chunk_index(),
            token_count: item.token_count(),
            content_hash: item.content_hash().to_string(),
            page_start: item.page_start(),
            page_end: item.page_end(),
            menu_path: item.menu_path().map(|s| s.to_string()),
            status: item.status().as_str().to_string(),
            retry_count: item.retry_count(),
            error_message: item.error().map(|s| s.to_string()),
            created_at: item.created_at(),
        }
    }
}

impl From<ChunkQueueModel> for ChunkQueueItem {
    fn from(model: ChunkQueueModel) -> Self {
        ChunkQueueItem::from_database(
            model.id,
            model.chunk_id,
            model.manual_id,
            model.tenant_id,
            model.content,
            model.chunk_index,
            model.token_count,
            model.content_hash,
            model.page_start,
            model.page_end,
            model.menu_path,
            QueueStatus::from_string(&model.status).unwrap_or(QueueStatus::Pending),
            model.retry_count,
            model.error_message,
            model.created_at,
        )
    }
}

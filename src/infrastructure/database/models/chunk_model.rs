use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{ChunkFlags, ManualChunk, SectionType};
use crate::infrastructure::database::schema::manual_chunks;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, QueryableByName)]
#[diesel(table_name = manual_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ManualChunkModel {
    pub id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub content: String,
    pub content_hash: String,
    pub embedding: Option<Vector>,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub section_heading: Option<String>,
    pub section_type: String,
    pub has_tables: bool,
    pub has_lists: bool,
    pub has_code_numbers: bool,
    pub quality_score: Option<f32>,
    pub created_at: DateTime<Utc>,
}

/// Chunk row joined with its cosine similarity, for raw vector queries.
#[derive(Debug, QueryableByName)]
pub struct ChunkHitRow {
    #[diesel(embed)]
    pub chunk: ManualChunkModel,
    #[diesel(sql_type = diesel::sql_types::Float4)]
    pub similarity: f32,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = manual_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct NewManualChunkModel {
    pub id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub content: String,
    pub content_hash: String,
    pub embedding: Option<Vector>,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub section_heading: Option<String>,
    pub section_type: String,
    pub has_tables: bool,
    pub has_lists: bool,
    pub has_code_numbers: bool,
    pub quality_score: Option<f32>,
    pub created_at: DateTime<Utc>,
}

impl From<&ManualChunk> for NewManualChunkModel {
    fn from(chunk: &ManualChunk) -> Self {
        Self {
            id: chunk.id(),
            manual_id: chunk.manual_id().to_string(),
            tenant_id: chunk.tenant_id().to_string(),
            content: chunk.content().to_string(),
            content_hash: chunk.content_hash().to_string(),
            embedding: chunk.embedding().cloned(),
            page_start: chunk.page_start(),
            page_end: chunk.page_end(),
            menu_path: chunk.menu_path().map(|s| s.to_string()),
            section_heading: chunk.section_heading().map(|s| s.to_string()),
            section_type: chunk.section_type().as_str().to_string(),
            has_tables: chunk.flags().has_tables,
            has_lists: chunk.flags().has_lists,
            has_code_numbers: chunk.flags().has_code_numbers,
            quality_score: chunk.quality_score(),
            created_at: chunk.created_at(),
        }
    }
}

impl From<ManualChunkModel> for ManualChunk {
    fn from(model: ManualChunkModel) -> Self {
        ManualChunk::from_database(
            model.id,
            model.manual_id,
            model.tenant_id,
            model.content,
            model.content_hash,
            model.embedding,
            model.page_start,
            model.page_end,
            model.menu_path,
            model.section_heading,
            SectionType::from_str_lossy(&model.section_type),
            ChunkFlags {
                has_tables: model.has_tables,
                has_lists: model.has_lists,
                has_code_numbers: model.has_code_numbers,
            },
            model.quality_score,
            model.created_at,
        )
    }
}

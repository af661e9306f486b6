use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Float4, Nullable, Text};
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::ManualChunk;
use crate::domain::repositories::chunk_repository::{ChunkRepositoryError, ChunkVectorHit};
use crate::domain::repositories::ChunkRepository;
use crate::infrastructure::database::models::{
    ChunkHitRow, ManualChunkModel, NewManualChunkModel,
};
use crate::infrastructure::database::schema::manual_chunks::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

const VECTOR_SEARCH_SQL: &str = "\
    SELECT *, (1 - (embedding <=> $1))::float4 AS similarity \
    FROM manual_chunks \
    WHERE embedding IS NOT NULL \
      AND ($2 IS NULL OR manual_id = $2) \
      AND ($3 IS NULL OR tenant_id = $3) \
      AND (1 - (embedding <=> $1))::float4 >= $4 \
    ORDER BY embedding <=> $1 \
    LIMIT $5";

pub struct PostgresChunkRepository {
    pool: DbPool,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn upsert(&self, chunk: &ManualChunk) -> Result<(), ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let new_chunk = NewManualChunkModel::from(chunk);

        diesel::insert_into(manual_chunks)
            .values(&new_chunk)
            .on_conflict((manual_id, content_hash))
            .do_update()
            .set(&new_chunk)
            .execute(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_id(&self, chunk_id: Uuid) -> Result<Option<ManualChunk>, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let result = manual_chunks
            .find(chunk_id)
            .first::<ManualChunkModel>(&mut conn)
            .optional()
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.map(ManualChunk::from))
    }

    async fn find_by_manual(
        &self,
        manual_id_param: &str,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let models = manual_chunks
            .filter(manual_id.eq(manual_id_param))
            .order((page_start.asc(), created_at.asc()))
            .load::<ManualChunkModel>(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        Ok(models.into_iter().map(ManualChunk::from).collect())
    }

    async fn count_by_manual(&self, manual_id_param: &str) -> Result<i64, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        manual_chunks
            .filter(manual_id.eq(manual_id_param))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
    }

    async fn max_page_end(
        &self,
        manual_id_param: &str,
    ) -> Result<Option<i32>, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        manual_chunks
            .filter(manual_id.eq(manual_id_param))
            .select(diesel::dsl::max(page_end))
            .first::<Option<i32>>(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
    }

    async fn replace_for_manual(
        &self,
        manual_id_param: &str,
        chunks: &[ManualChunk],
        insert_batch_size: usize,
    ) -> Result<usize, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let new_chunks: Vec<NewManualChunkModel> =
            chunks.iter().map(NewManualChunkModel::from).collect();
        let batch_size = insert_batch_size.max(1);

        conn.transaction::<usize, diesel::result::Error, _>(|conn| {
            diesel::delete(manual_chunks.filter(manual_id.eq(manual_id_param))).execute(conn)?;

            let mut inserted = 0;
            for batch in new_chunks.chunks(batch_size) {
                inserted += diesel::insert_into(manual_chunks).values(batch).execute(conn)?;
            }
            Ok(inserted)
        })
        .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))
    }

    async fn vector_search(
        &self,
        query: &Vector,
        manual_id_param: Option<&str>,
        tenant_id_param: Option<&str>,
        min_similarity: f32,
        limit_param: i64,
    ) -> Result<Vec<ChunkVectorHit>, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let rows = diesel::sql_query(VECTOR_SEARCH_SQL)
            .bind::<pgvector::sql_types::Vector, _>(query.clone())
            .bind::<Nullable<Text>, _>(manual_id_param)
            .bind::<Nullable<Text>, _>(tenant_id_param)
            .bind::<Float4, _>(min_similarity)
            .bind::<BigInt, _>(limit_param)
            .load::<ChunkHitRow>(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ChunkVectorHit {
                chunk: ManualChunk::from(row.chunk),
                similarity: row.similarity,
            })
            .collect())
    }

    async fn lexical_search(
        &self,
        terms: &[String],
        manual_id_param: Option<&str>,
        tenant_id_param: Option<&str>,
        limit_param: i64,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError> {
        if terms.is_empty() {
            return Ok(Vec::new());
        }

        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let patterns: Vec<String> = terms
            .iter()
            .map(|t| format!("%{}%", t.replace('%', "\\%").replace('_', "\\_")))
            .collect();

        let rows = diesel::sql_query(
            "SELECT * FROM manual_chunks \
             WHERE content ILIKE ANY($1) \
               AND ($2 IS NULL OR manual_id = $2) \
               AND ($3 IS NULL OR tenant_id = $3) \
             ORDER BY page_start \
             LIMIT $4",
        )
        .bind::<diesel::sql_types::Array<Text>, _>(patterns)
        .bind::<Nullable<Text>, _>(manual_id_param)
        .bind::<Nullable<Text>, _>(tenant_id_param)
        .bind::<BigInt, _>(limit_param)
        .load::<ManualChunkModel>(&mut conn)
        .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        Ok(rows.into_iter().map(ManualChunk::from).collect())
    }

    async fn find_by_page_window(
        &self,
        manual_id_param: &str,
        page: i32,
        radius: i32,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        let models = manual_chunks
            .filter(manual_id.eq(manual_id_param))
            .filter(page_end.ge(page - radius))
            .filter(page_start.le(page + radius))
            .order(page_start.asc())
            .load::<ManualChunkModel>(&mut conn)
            .map_err(|e| ChunkRepositoryError::DatabaseError(e.to_string()))?;

        Ok(models.into_iter().map(ManualChunk::from).collect())
    }
}

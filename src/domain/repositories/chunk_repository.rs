use async_trait::async_trait;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::ManualChunk;

#[derive(Debug)]
pub enum ChunkRepositoryError {
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for ChunkRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ChunkRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for ChunkRepositoryError {}

/// A chunk row with its cosine similarity against the query vector.
#[derive(Debug, Clone)]
pub struct ChunkVectorHit {
    pub chunk: ManualChunk,
    pub similarity: f32,
}

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    /// Insert or update on (manual_id, content_hash).
    async fn upsert(&self, chunk: &ManualChunk) -> Result<(), ChunkRepositoryError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ManualChunk>, ChunkRepositoryError>;

    async fn find_by_manual(
        &self,
        manual_id: &str,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError>;

    async fn count_by_manual(&self, manual_id: &str) -> Result<i64, ChunkRepositoryError>;

    async fn max_page_end(&self, manual_id: &str) -> Result<Option<i32>, ChunkRepositoryError>;

    /// Delete every chunk of the manual and insert the replacement set in one
    /// transaction, inserting in batches of `insert_batch_size`. The swap is
    /// the only sanctioned way to fully rewrite a manual's chunks.
    async fn replace_for_manual(
        &self,
        manual_id: &str,
        chunks: &[ManualChunk],
        insert_batch_size: usize,
    ) -> Result<usize, ChunkRepositoryError>;

    /// Nearest chunks by cosine similarity, above `min_similarity`.
    async fn vector_search(
        &self,
        query: &Vector,
        manual_id: Option<&str>,
        tenant_id: Option<&str>,
        min_similarity: f32,
        limit: i64,
    ) -> Result<Vec<ChunkVectorHit>, ChunkRepositoryError>;

    /// Chunks whose content matches any of the given terms (case-insensitive
    /// substring match). Scoring happens in the search service.
    async fn lexical_search(
        &self,
        terms: &[String],
        manual_id: Option<&str>,
        tenant_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError>;

    /// Chunks overlapping the page window [page - radius, page + radius],
    /// used to build figure embedding context.
    async fn find_by_page_window(
        &self,
        manual_id: &str,
        page: i32,
        radius: i32,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError>;
}

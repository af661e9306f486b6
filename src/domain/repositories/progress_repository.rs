use async_trait::async_trait;

use crate::domain::entities::IngestionProgress;

#[derive(Debug)]
pub enum ProgressRepositoryError {
    DatabaseError(String),
}

impl std::fmt::Display for ProgressRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for ProgressRepositoryError {}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// One row per manual; writes replace the previous snapshot.
    async fn upsert(&self, progress: &IngestionProgress) -> Result<(), ProgressRepositoryError>;

    async fn find_by_manual(
        &self,
        manual_id: &str,
    ) -> Result<Option<IngestionProgress>, ProgressRepositoryError>;
}

use async_trait::async_trait;

use crate::domain::entities::Manual;

#[derive(Debug)]
pub enum ManualRepositoryError {
    DatabaseError(String),
    NotFound(String),
}

impl std::fmt::Display for ManualRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ManualRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ManualRepositoryError::NotFound(id) => write!(f, "Manual not found: {}", id),
        }
    }
}

impl std::error::Error for ManualRepositoryError {}

#[async_trait]
pub trait ManualRepository: Send + Sync {
    /// Insert or update on the stable external key.
    async fn upsert(&self, manual: &Manual) -> Result<(), ManualRepositoryError>;

    async fn find_by_manual_id(
        &self,
        manual_id: &str,
    ) -> Result<Option<Manual>, ManualRepositoryError>;

    async fn update_page_count(
        &self,
        manual_id: &str,
        page_count: i32,
    ) -> Result<(), ManualRepositoryError>;
}

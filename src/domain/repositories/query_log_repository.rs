use async_trait::async_trait;

use crate::domain::entities::QueryLog;

#[derive(Debug)]
pub enum QueryLogRepositoryError {
    DatabaseError(String),
}

impl std::fmt::Display for QueryLogRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryLogRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for QueryLogRepositoryError {}

#[async_trait]
pub trait QueryLogRepository: Send + Sync {
    /// Append-only; rows are never updated after insert.
    async fn insert(&self, log: &QueryLog) -> Result<(), QueryLogRepositoryError>;
}

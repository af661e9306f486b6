use async_trait::async_trait;
use pgvector::Vector;

use crate::domain::entities::Figure;

#[derive(Debug)]
pub enum FigureRepositoryError {
    DatabaseError(String),
    ValidationError(String),
}

impl std::fmt::Display for FigureRepositoryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FigureRepositoryError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            FigureRepositoryError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for FigureRepositoryError {}

#[derive(Debug, Clone)]
pub struct FigureVectorHit {
    pub figure: Figure,
    pub similarity: f32,
}

#[async_trait]
pub trait FigureRepository: Send + Sync {
    async fn save_batch(&self, figures: &[Figure]) -> Result<usize, FigureRepositoryError>;

    async fn update(&self, figure: &Figure) -> Result<(), FigureRepositoryError>;

    async fn find_pending(&self, manual_id: &str) -> Result<Vec<Figure>, FigureRepositoryError>;

    async fn find_by_manual(&self, manual_id: &str) -> Result<Vec<Figure>, FigureRepositoryError>;

    async fn count_by_manual(&self, manual_id: &str) -> Result<i64, FigureRepositoryError>;

    async fn vector_search(
        &self,
        query: &Vector,
        manual_id: Option<&str>,
        tenant_id: Option<&str>,
        min_similarity: f32,
        limit: i64,
    ) -> Result<Vec<FigureVectorHit>, FigureRepositoryError>;
}

use async_trait::async_trait;
use diesel::prelude::*;
use diesel::sql_types::{BigInt, Float4, Nullable, Text};
use pgvector::Vector;

use crate::domain::entities::{Figure, OcrStatus};
use crate::domain::repositories::figure_repository::{FigureRepositoryError, FigureVectorHit};
use crate::domain::repositories::FigureRepository;
use crate::infrastructure::database::models::{
    FigureHitRow, ManualFigureModel, NewManualFigureModel,
};
use crate::infrastructure::database::schema::manual_figures::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

const VECTOR_SEARCH_SQL: &str = "\
    SELECT *, (1 - (embedding <=> $1))::float4 AS similarity \
    FROM manual_figures \
    WHERE embedding IS NOT NULL \
      AND ($2 IS NULL OR manual_id = $2) \
      AND ($3 IS NULL OR tenant_id = $3) \
      AND (1 - (embedding <=> $1))::float4 >= $4 \
    ORDER BY embedding <=> $1 \
    LIMIT $5";

pub struct PostgresFigureRepository {
    pool: DbPool,
}

impl PostgresFigureRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FigureRepository for PostgresFigureRepository {
    async fn save_batch(&self, figures: &[Figure]) -> Result<usize, FigureRepositoryError> {
        if figures.is_empty() {
            return Ok(0);
        }

        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        let new_figures: Vec<NewManualFigureModel> =
            figures.iter().map(NewManualFigureModel::from).collect();

        diesel::insert_into(manual_figures)
            .values(&new_figures)
            .execute(&mut conn)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))
    }

    async fn update(&self, figure: &Figure) -> Result<(), FigureRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        let update_model = NewManualFigureModel::from(figure);

        diesel::update(manual_figures.find(figure.id()))
            .set(&update_model)
            .execute(&mut conn)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_pending(
        &self,
        manual_id_param: &str,
    ) -> Result<Vec<Figure>, FigureRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        let models = manual_figures
            .filter(manual_id.eq(manual_id_param))
            .filter(ocr_status.eq(OcrStatus::Pending.as_str()))
            .order(page_number.asc())
            .load::<ManualFigureModel>(&mut conn)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        Ok(models.into_iter().map(Figure::from).collect())
    }

    async fn find_by_manual(
        &self,
        manual_id_param: &str,
    ) -> Result<Vec<Figure>, FigureRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        let models = manual_figures
            .filter(manual_id.eq(manual_id_param))
            .order(page_number.asc())
            .load::<ManualFigureModel>(&mut conn)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        Ok(models.into_iter().map(Figure::from).collect())
    }

    async fn count_by_manual(&self, manual_id_param: &str) -> Result<i64, FigureRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        manual_figures
            .filter(manual_id.eq(manual_id_param))
            .count()
            .get_result::<i64>(&mut conn)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))
    }

    async fn vector_search(
        &self,
        query: &Vector,
        manual_id_param: Option<&str>,
        tenant_id_param: Option<&str>,
        min_similarity: f32,
        limit: i64,
    ) -> Result<Vec<FigureVectorHit>, FigureRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        let rows = diesel::sql_query(VECTOR_SEARCH_SQL)
            .bind::<pgvector::sql_types::Vector, _>(query.clone())
            .bind::<Nullable<Text>, _>(manual_id_param)
            .bind::<Nullable<Text>, _>(tenant_id_param)
            .bind::<Float4, _>(min_similarity)
            .bind::<BigInt, _>(limit)
            .load::<FigureHitRow>(&mut conn)
            .map_err(|e| FigureRepositoryError::DatabaseError(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| FigureVectorHit {
                figure: Figure::from(row.figure),
                similarity: row.similarity,
            })
            .collect())
    }
}

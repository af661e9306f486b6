use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::IngestionProgress;
use crate::domain::repositories::{ProgressRepository, progress_repository::ProgressRepositoryError};
use crate::infrastructure::database::models::{IngestionProgressModel, NewIngestionProgressModel};
use crate::infrastructure::database::schema::ingestion_progress::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresProgressRepository {
    pool: DbPool,
}

impl PostgresProgressRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ProgressRepository for PostgresProgressRepository {
    async fn upsert(&self, progress: &IngestionProgress) -> Result<(), ProgressRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ProgressRepositoryError::DatabaseError(e.to_string()))?;

        let snapshot = NewIngestionProgressModel::from(progress);

        diesel::insert_into(ingestion_progress)
            .values(&snapshot)
            .on_conflict(manual_id)
            .do_update()
            .set(&snapshot)
            .execute(&mut conn)
            .map_err(|e| ProgressRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_manual(
        &self,
        manual_id_param: &str,
    ) -> Result<Option<IngestionProgress>, ProgressRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ProgressRepositoryError::DatabaseError(e.to_string()))?;

        let result = ingestion_progress
            .find(manual_id_param)
            .first::<IngestionProgressModel>(&mut conn)
            .optional()
            .map_err(|e| ProgressRepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.map(IngestionProgress::from))
    }
}

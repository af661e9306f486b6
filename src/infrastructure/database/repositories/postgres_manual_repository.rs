use async_trait::async_trait;
use chrono::Utc;
use diesel::prelude::*;

use crate::domain::entities::Manual;
use crate::domain::repositories::{ManualRepository, manual_repository::ManualRepositoryError};
use crate::infrastructure::database::models::{ManualModel, NewManualModel};
use crate::infrastructure::database::schema::manuals::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresManualRepository {
    pool: DbPool,
}

impl PostgresManualRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ManualRepository for PostgresManualRepository {
    async fn upsert(&self, manual: &Manual) -> Result<(), ManualRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ManualRepositoryError::DatabaseError(e.to_string()))?;

        let new_manual = NewManualModel::from(manual);

        diesel::insert_into(manuals)
            .values(&new_manual)
            .on_conflict(manual_id)
            .do_update()
            .set((
                file_name.eq(&new_manual.file_name),
                parse_job_id.eq(&new_manual.parse_job_id),
                page_count.eq(new_manual.page_count),
                updated_at.eq(new_manual.updated_at),
            ))
            .execute(&mut conn)
            .map_err(|e| ManualRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }

    async fn find_by_manual_id(
        &self,
        manual_id_param: &str,
    ) -> Result<Option<Manual>, ManualRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ManualRepositoryError::DatabaseError(e.to_string()))?;

        let result = manuals
            .filter(manual_id.eq(manual_id_param))
            .first::<ManualModel>(&mut conn)
            .optional()
            .map_err(|e| ManualRepositoryError::DatabaseError(e.to_string()))?;

        Ok(result.map(Manual::from))
    }

    async fn update_page_count(
        &self,
        manual_id_param: &str,
        page_count_param: i32,
    ) -> Result<(), ManualRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| ManualRepositoryError::DatabaseError(e.to_string()))?;

        let updated = diesel::update(manuals.filter(manual_id.eq(manual_id_param)))
            .set((page_count.eq(page_count_param), updated_at.eq(Utc::now())))
            .execute(&mut conn)
            .map_err(|e| ManualRepositoryError::DatabaseError(e.to_string()))?;

        if updated == 0 {
            return Err(ManualRepositoryError::NotFound(manual_id_param.to_string()));
        }

        Ok(())
    }
}

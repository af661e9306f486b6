use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::QueryLog;
use crate::domain::repositories::{
    QueryLogRepository, query_log_repository::QueryLogRepositoryError,
};
use crate::infrastructure::database::models::NewQueryLogModel;
use crate::infrastructure::database::schema::query_logs::dsl::*;
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresQueryLogRepository {
    pool: DbPool,
}

impl PostgresQueryLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl QueryLogRepository for PostgresQueryLogRepository {
    async fn insert(&self, log: &QueryLog) -> Result<(), QueryLogRepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)
            .map_err(|e| QueryLogRepositoryError::DatabaseError(e.to_string()))?;

        let new_log = NewQueryLogModel::from(log);

        diesel::insert_into(query_logs)
            .values(&new_log)
            .execute(&mut conn)
            .map_err(|e| QueryLogRepositoryError::DatabaseError(e.to_string()))?;

        Ok(())
    }
}

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::QueryLog;
use crate::infrastructure::database::schema::query_logs;

#[derive(Debug, Insertable)]
#[diesel(table_name = query_logs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewQueryLogModel {
    pub id: Uuid,
    pub query_text: String,
    pub response_text: String,
    pub manual_id: Option<String>,
    pub tenant_id: String,
    pub quality_score: f32,
    pub quality_tier: String,
    pub claim_coverage: Option<f32>,
    pub numeric_flags: Option<i32>,
    pub retrieval_method: String,
    pub adaptive_mode: String,
    pub model_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<&QueryLog> for NewQueryLogModel {
    fn from(log: &QueryLog) -> Self {
        Self {
            id: log.id(),
            query_text: log.query_text().to_string(),
            response_text: log.response_text().to_string(),
            manual_id: log.manual_id().map(|s| s.to_string()),
            tenant_id: log.tenant_id().to_string(),
            quality_score: log.quality_score(),
            quality_tier: log.quality_tier().as_str().to_string(),
            claim_coverage: log.claim_coverage(),
            numeric_flags: log.numeric_flags(),
            retrieval_method: log.retrieval_method().to_string(),
            adaptive_mode: log.adaptive_mode().to_string(),
            model_name: log.model_name().to_string(),
            created_at: log.created_at(),
        }
    }
}

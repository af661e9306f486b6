use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::entities::Manual;
use crate::infrastructure::database::schema::manuals;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = manuals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ManualModel {
    pub id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub file_name: String,
    pub parse_job_id: Option<String>,
    pub page_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = manuals)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct NewManualModel {
    pub id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub file_name: String,
    pub parse_job_id: Option<String>,
    pub page_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Manual> for NewManualModel {
    fn from(manual: &Manual) -> Self {
        Self {
            id: manual.id(),
            manual_id: manual.manual_id().to_string(),
            tenant_id: manual.tenant_id().to_string(),
            file_name: manual.file_name().to_string(),
            parse_job_id: manual.parse_job_id().map(|s| s.to_string()),
            page_count: manual.page_count(),
            created_at: manual.created_at(),
            updated_at: manual.updated_at(),
        }
    }
}

impl From<ManualModel> for Manual {
    fn from(model: ManualModel) -> Self {
        Manual::from_database(
            model.id,
            model.manual_id,
            model.tenant_id,
            model.file_name,
            model.parse_job_id,
            model.page_count,
            model.created_at,
            model.updated_at,
        )
    }
}

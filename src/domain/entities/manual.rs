use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One ingested manual. `manual_id` is the stable external key handed to us
/// by the upload pipeline; `id` is our own row identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manual {
    id: Uuid,
    manual_id: String,
    tenant_id: String,
    file_name: String,
    parse_job_id: Option<String>,
    page_count: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Manual {
    pub fn new(
        manual_id: String,
        tenant_id: String,
        file_name: String,
        parse_job_id: Option<String>,
        page_count: i32,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            manual_id,
            tenant_id,
            file_name,
            parse_job_id,
            page_count,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn from_database(
        id: Uuid,
        manual_id: String,
        tenant_id: String,
        file_name: String,
        parse_job_id: Option<String>,
        page_count: i32,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            manual_id,
            tenant_id,
            file_name,
            parse_job_id,
            page_count,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn manual_id(&self) -> &str {
        &self.manual_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn parse_job_id(&self) -> Option<&str> {
        self.parse_job_id.as_deref()
    }

    pub fn page_count(&self) -> i32 {
        self.page_count
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn set_page_count(&mut self, page_count: i32) {
        self.page_count = page_count;
        self.updated_at = Utc::now();
    }
}

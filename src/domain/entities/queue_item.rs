use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status machine for a queued ingestion unit. Transitions are monotonic:
/// pending -> processing (while a batch holds the claim) -> done | failed.
/// Failed items keep their retry counter and are only re-driven by an
/// explicit re-ingestion or retry call, never resurrected automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QueueStatus {
    Pending,
    Processing,
    Done,
    Failed,
}

impl QueueStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueueStatus::Pending => "pending",
            QueueStatus::Processing => "processing",
            QueueStatus::Done => "done",
            QueueStatus::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "processing" => Ok(QueueStatus::Processing),
            "done" => Ok(QueueStatus::Done),
            "failed" => Ok(QueueStatus::Failed),
            _ => Err(format!("Invalid queue status: {}", s)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Done | QueueStatus::Failed)
    }
}

impl std::fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One pending unit of ingestion work for a manual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkQueueItem {
    id: Uuid,
    chunk_id: Uuid,
    manual_id: String,
    tenant_id: String,
    content: String,
    chunk_index: i32,
    token_count: Option<i32>,
    content_hash: String,
    page_start: i32,
    page_end: i32,
    menu_path: Option<String>,
    status: QueueStatus,
    retry_count: i32,
    error: Option<String>,
    created_at: DateTime<Utc>,
}

impl ChunkQueueItem {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        manual_id: String,
        tenant_id: String,
        content: String,
        chunk_index: i32,
        token_count: Option<i32>,
        content_hash: String,
        page_start: i32,
        page_end: i32,
        menu_path: Option<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            chunk_id: Uuid::new_v4(),
            manual_id,
            tenant_id,
            content,
            chunk_index,
            token_count,
            content_hash,
            page_start,
            page_end,
            menu_path,
            status: QueueStatus::Pending,
            retry_count: 0,
            error: None,
            created_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        chunk_id: Uuid,
        manual_id: String,
        tenant_id: String,
        content: String,
        chunk_index: i32,
        token_count: Option<i32>,
        content_hash: String,
        page_start: i32,
        page_end: i32,
        menu_path: Option<String>,
        status: QueueStatus,
        retry_count: i32,
        error: Option<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            chunk_id,
            manual_id,
            tenant_id,
            content,
            chunk_index,
            token_count,
            content_hash,
            page_start,
            page_end,
            menu_path,
            status,
            retry_count,
            error,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn chunk_id(&self) -> Uuid {
        self.chunk_id
    }

    pub fn manual_id(&self) -> &str {
        &self.manual_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn chunk_index(&self) -> i32 {
        self.chunk_index
    }

    pub fn token_count(&self) -> Option<i32> {
        self.token_count
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn page_start(&self) -> i32 {
        self.page_start
    }

    pub fn page_end(&self) -> i32 {
        self.page_end
    }

    pub fn menu_path(&self) -> Option<&str> {
        self.menu_path.as_deref()
    }

    pub fn status(&self) -> QueueStatus {
        self.status
    }

    pub fn retry_count(&self) -> i32 {
        self.retry_count
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn mark_done(&mut self) -> Result<(), String> {
        if self.status.is_terminal() {
            return Err(format!("Item {} is already terminal", self.id));
        }
        self.status = QueueStatus::Done;
        self.error = None;
        Ok(())
    }

    pub fn mark_failed(&mut self, error: String) -> Result<(), String> {
        if self.status.is_terminal() {
            return Err(format!("Item {} is already terminal", self.id));
        }
        self.status = QueueStatus::Failed;
        self.retry_count += 1;
        self.error = Some(error);
        Ok(())
    }
}

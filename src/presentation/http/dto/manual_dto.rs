use serde::{Deserialize, Serialize};

use crate::application::services::ingestion_service::{
    FigureRef, IngestRequest, IntakeSummary, PageText,
};
use crate::domain::entities::IngestionProgress;

#[derive(Debug, Deserialize)]
pub struct PageTextDto {
    pub page_number: i32,
    pub text: String,
    pub menu_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FigureRefDto {
    pub page_number: i32,
    pub storage_url: String,
}

#[derive(Debug, Deserialize)]
pub struct IngestRequestDto {
    pub manual_id: String,
    pub tenant_id: String,
    pub file_name: String,
    pub parse_job_id: Option<String>,
    pub pages: Vec<PageTextDto>,
    #[serde(default)]
    pub figures: Vec<FigureRefDto>,
}

impl From<IngestRequestDto> for IngestRequest {
    fn from(dto: IngestRequestDto) -> Self {
        IngestRequest {
            manual_id: dto.manual_id,
            tenant_id: dto.tenant_id,
            file_name: dto.file_name,
            parse_job_id: dto.parse_job_id,
            pages: dto
                .pages
                .into_iter()
                .map(|p| PageText {
                    page_number: p.page_number,
                    text: p.text,
                    menu_path: p.menu_path,
                })
                .collect(),
            figures: dto
                .figures
                .into_iter()
                .map(|f| FigureRef {
                    page_number: f.page_number,
                    storage_url: f.storage_url,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IngestAcceptedDto {
    pub manual_id: String,
    pub page_count: i32,
    pub queued_chunks: usize,
    pub queued_figures: usize,
}

impl IngestAcceptedDto {
    pub fn from_summary(manual_id: String, summary: IntakeSummary) -> Self {
        Self {
            manual_id,
            page_count: summary.page_count,
            queued_chunks: summary.queued_chunks,
            queued_figures: summary.queued_figures,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ProgressResponseDto {
    pub manual_id: String,
    pub chunks_processed: i32,
    pub total_chunks: i32,
    pub figures_processed: i32,
    pub total_figures: i32,
    pub progress_percent: i32,
    pub current_task: String,
    pub state: String,
    pub updated_at: String,
}

impl From<IngestionProgress> for ProgressResponseDto {
    fn from(progress: IngestionProgress) -> Self {
        Self {
            manual_id: progress.manual_id().to_string(),
            chunks_processed: progress.chunks_processed(),
            total_chunks: progress.total_chunks(),
            figures_processed: progress.figures_processed(),
            total_figures: progress.total_figures(),
            progress_percent: progress.progress_percent(),
            current_task: progress.current_task().to_string(),
            state: progress.state().as_str().to_string(),
            updated_at: progress.updated_at().to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RetryResponseDto {
    pub manual_id: String,
    pub requeued: i64,
}

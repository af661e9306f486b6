use chrono::{DateTime, Utc};
use diesel::prelude::*;

use crate::domain::entities::{IngestionProgress, IngestionState};
use crate::infrastructure::database::schema::ingestion_progress;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = ingestion_progress)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct IngestionProgressModel {
    pub manual_id: String,
    pub chunks_processed: i32,
    pub total_chunks: i32,
    pub figures_processed: i32,
    pub total_figures: i32,
    pub progress_percent: i32,
    pub current_task: String,
    pub state: String,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = ingestion_progress)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewIngestionProgressModel {
    pub manual_id: String,
    pub chunks_processed: i32,
    pub total_chunks: i32,
    pub figures_processed: i32,
    pub total_figures: i32,
    pub progress_percent: i32,
    pub current_task: String,
    pub state: String,
    pub updated_at: DateTime<Utc>,
}

impl From<&IngestionProgress> for NewIngestionProgressModel {
    fn from(progress: &IngestionProgress) -> Self {
        Self {
            manual_id: progress.manual_id().to_string(),
            chunks_processed: progress.chunks_processed(),
            total_chunks: progress.total_chunks(),
            figures_processed: progress.figures_processed(),
            total_figures: progress.total_figures(),
            progress_percent: progress.progress_percent(),
            current_task: progress.current_task().to_string(),
            state: progress.state().as_str().to_string(),
            updated_at: progress.updated_at(),
        }
    }
}

impl From<IngestionProgressModel> for IngestionProgress {
    fn from(model: IngestionProgressModel) -> Self {
        IngestionProgress::from_database(
            model.manual_id,
            model.chunks_processed,
            model.total_chunks,
            model.figures_processed,
            model.total_figures,
            model.progress_percent,
            model.current_task,
            IngestionState::from_string(&model.state).unwrap_or(IngestionState::Pending),
            model.updated_at,
        )
    }
}

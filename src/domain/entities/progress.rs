use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Overall ingestion state for a manual, read by UI pollers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestionState {
    Pending,
    Processing,
    Completed,
    CompletedWithErrors,
    Failed,
}

impl IngestionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            IngestionState::Pending => "pending",
            IngestionState::Processing => "processing",
            IngestionState::Completed => "completed",
            IngestionState::CompletedWithErrors => "completed_with_errors",
            IngestionState::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(IngestionState::Pending),
            "processing" => Ok(IngestionState::Processing),
            "completed" => Ok(IngestionState::Completed),
            "completed_with_errors" => Ok(IngestionState::CompletedWithErrors),
            "failed" => Ok(IngestionState::Failed),
            _ => Err(format!("Invalid ingestion state: {}", s)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            IngestionState::Completed | IngestionState::CompletedWithErrors | IngestionState::Failed
        )
    }
}

/// Per-manual ingestion progress snapshot. Progress only moves forward and
/// stays capped at 99 until the job actually finishes, so pollers never see
/// a premature 100.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestionProgress {
    manual_id: String,
    chunks_processed: i32,
    total_chunks: i32,
    figures_processed: i32,
    total_figures: i32,
    progress_percent: i32,
    current_task: String,
    state: IngestionState,
    updated_at: DateTime<Utc>,
}

impl IngestionProgress {
    pub fn new(manual_id: String, total_chunks: i32, total_figures: i32) -> Self {
        Self {
            manual_id,
            chunks_processed: 0,
            total_chunks,
            figures_processed: 0,
            total_figures,
            progress_percent: 0,
            current_task: "Queued for processing".to_string(),
            state: IngestionState::Pending,
            updated_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        manual_id: String,
        chunks_processed: i32,
        total_chunks: i32,
        figures_processed: i32,
        total_figures: i32,
        progress_percent: i32,
        current_task: String,
        state: IngestionState,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Self {
            manual_id,
            chunks_processed,
            total_chunks,
            figures_processed,
            total_figures,
            progress_percent,
            current_task,
            state,
            updated_at,
        }
    }

    pub fn manual_id(&self) -> &str {
        &self.manual_id
    }

    pub fn chunks_processed(&self) -> i32 {
        self.chunks_processed
    }

    pub fn total_chunks(&self) -> i32 {
        self.total_chunks
    }

    pub fn figures_processed(&self) -> i32 {
        self.figures_processed
    }

    pub fn total_figures(&self) -> i32 {
        self.total_figures
    }

    pub fn progress_percent(&self) -> i32 {
        self.progress_percent
    }

    pub fn current_task(&self) -> &str {
        &self.current_task
    }

    pub fn state(&self) -> IngestionState {
        self.state
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn record_chunks(&mut self, processed: i32, task: String) {
        self.chunks_processed = processed.min(self.total_chunks);
        self.current_task = task;
        self.state = IngestionState::Processing;
        self.recompute_percent();
    }

    pub fn record_figures(&mut self, processed: i32, task: String) {
        self.figures_processed = processed.min(self.total_figures);
        self.current_task = task;
        self.state = IngestionState::Processing;
        self.recompute_percent();
    }

    pub fn finish(&mut self, state: IngestionState, task: String) {
        self.state = state;
        self.current_task = task;
        if matches!(
            state,
            IngestionState::Completed | IngestionState::CompletedWithErrors
        ) {
            self.progress_percent = 100;
        }
        self.updated_at = Utc::now();
    }

    fn recompute_percent(&mut self) {
        let total = (self.total_chunks + self.total_figures).max(1);
        let done = self.chunks_processed + self.figures_processed;
        let pct = ((done as f64 / total as f64) * 100.0) as i32;
        // Monotonic, and never 100 before finish() says so.
        self.progress_percent = pct.min(99).max(self.progress_percent);
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_percent_is_monotonic_and_capped() {
        let mut progress = IngestionProgress::new("m-1".to_string(), 100, 0);
        progress.record_chunks(50, "Embedding chunks".to_string());
        assert_eq!(progress.progress_percent(), 50);

        // A lower observation never moves the needle backwards.
        progress.record_chunks(30, "Embedding chunks".to_string());
        assert_eq!(progress.progress_percent(), 50);

        progress.record_chunks(100, "Embedding chunks".to_string());
        assert_eq!(progress.progress_percent(), 99);

        progress.finish(IngestionState::Completed, "Done".to_string());
        assert_eq!(progress.progress_percent(), 100);
    }

    #[test]
    fn test_failed_finish_keeps_partial_percent() {
        let mut progress = IngestionProgress::new("m-1".to_string(), 10, 0);
        progress.record_chunks(5, "Embedding chunks".to_string());
        progress.finish(IngestionState::Failed, "Queue lock failed".to_string());
        assert_eq!(progress.state(), IngestionState::Failed);
        assert!(progress.progress_percent() < 100);
    }

    #[test]
    fn test_zero_totals_do_not_divide_by_zero() {
        let mut progress = IngestionProgress::new("m-1".to_string(), 0, 0);
        progress.record_chunks(0, "Nothing to do".to_string());
        assert_eq!(progress.progress_percent(), 0);
    }
}

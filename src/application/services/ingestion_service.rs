use chrono::Utc;
use futures::stream::{self, StreamExt};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::ports::embedding_provider::{EmbeddingProvider, truncate_for_embedding};
use crate::application::services::chunk_metadata::{classify_section, detect_flags, score_chunk};
use crate::application::services::chunking::{
    ChunkingConfig, content_hash, estimate_tokens, split_with_overlap,
};
use crate::domain::entities::{
    ChunkQueueItem, Figure, IngestionProgress, IngestionState, Manual, ManualChunk, QueueStatus,
};
use crate::domain::repositories::{
    ChunkRepository, FigureRepository, ManualRepository, ProgressRepository, QueueRepository,
};

#[derive(Debug)]
pub enum IngestionServiceError {
    ValidationError(String),
    RepositoryError(String),
    /// The batch claim itself failed; the whole job is marked failed because
    /// without the claim nothing can make progress.
    JobFailed(String),
}

impl std::fmt::Display for IngestionServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IngestionServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            IngestionServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            IngestionServiceError::JobFailed(msg) => write!(f, "Ingestion job failed: {}", msg),
        }
    }
}

impl std::error::Error for IngestionServiceError {}

#[derive(Debug, Clone, Copy)]
pub struct IngestionConfig {
    /// Queue items claimed per batch.
    pub batch_size: i64,
    /// Items embedded concurrently within a claimed batch.
    pub max_in_flight: usize,
    pub chunking: ChunkingConfig,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            batch_size: 30,
            max_in_flight: 5,
            chunking: ChunkingConfig::default(),
        }
    }
}

impl IngestionConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            batch_size: std::env::var("INGEST_BATCH_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.batch_size),
            max_in_flight: std::env::var("INGEST_MAX_IN_FLIGHT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_in_flight),
            chunking: ChunkingConfig::from_env(),
        }
    }
}

/// Parsed text of one manual page, as delivered by the upload pipeline.
#[derive(Debug, Clone)]
pub struct PageText {
    pub page_number: i32,
    pub text: String,
    pub menu_path: Option<String>,
}

/// Reference to an extracted page image awaiting enrichment.
#[derive(Debug, Clone)]
pub struct FigureRef {
    pub page_number: i32,
    pub storage_url: String,
}

#[derive(Debug, Clone)]
pub struct IngestRequest {
    pub manual_id: String,
    pub tenant_id: String,
    pub file_name: String,
    pub parse_job_id: Option<String>,
    pub pages: Vec<PageText>,
    pub figures: Vec<FigureRef>,
}

#[derive(Debug, Clone, Copy)]
pub struct IntakeSummary {
    pub page_count: i32,
    pub queued_chunks: usize,
    pub queued_figures: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOutcome {
    pub processed: usize,
    pub failed: usize,
    pub remaining_pending: i64,
}

/// Drives manual intake and the batched embed-and-store worker. A single
/// invocation claims one batch; the background processor keeps re-queueing
/// the job until `remaining_pending` hits zero.
pub struct IngestionService {
    manual_repository: Arc<dyn ManualRepository>,
    queue_repository: Arc<dyn QueueRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
    figure_repository: Arc<dyn FigureRepository>,
    progress_repository: Arc<dyn ProgressRepository>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: IngestionConfig,
}

impl IngestionService {
    pub fn new(
        manual_repository: Arc<dyn ManualRepository>,
        queue_repository: Arc<dyn QueueRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
        figure_repository: Arc<dyn FigureRepository>,
        progress_repository: Arc<dyn ProgressRepository>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: IngestionConfig,
    ) -> Self {
        Self {
            manual_repository,
            queue_repository,
            chunk_repository,
            figure_repository,
            progress_repository,
            embedding_provider,
            config,
        }
    }

    /// Register a manual and enqueue its chunk and figure work. Chunks are
    /// deduplicated by content hash before they ever hit the queue.
    pub async fn register_manual(
        &self,
        request: IngestRequest,
    ) -> Result<IntakeSummary, IngestionServiceError> {
        if request.manual_id.trim().is_empty() || request.tenant_id.trim().is_empty() {
            return Err(IngestionServiceError::ValidationError(
                "manual_id and tenant_id are required".to_string(),
            ));
        }
        if request.pages.is_empty() {
            return Err(IngestionServiceError::ValidationError(
                "at least one page of text is required".to_string(),
            ));
        }

        let page_count = request
            .pages
            .iter()
            .map(|p| p.page_number)
            .max()
            .unwrap_or(0);

        let manual = Manual::new(
            request.manual_id.clone(),
            request.tenant_id.clone(),
            request.file_name.clone(),
            request.parse_job_id.clone(),
            page_count,
        );
        self.manual_repository
            .upsert(&manual)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        let mut seen_hashes = HashSet::new();
        let mut items = Vec::new();
        for page in &request.pages {
            for piece in split_with_overlap(&page.text, self.config.chunking) {
                let hash = content_hash(&piece);
                if !seen_hashes.insert(hash.clone()) {
                    continue;
                }
                let token_count = estimate_tokens(&piece);
                items.push(ChunkQueueItem::new(
                    request.manual_id.clone(),
                    request.tenant_id.clone(),
                    piece,
                    items.len() as i32,
                    Some(token_count),
                    hash,
                    page.page_number,
                    page.page_number,
                    page.menu_path.clone(),
                ));
            }
        }

        self.queue_repository
            .enqueue_batch(&items)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        let figures: Vec<Figure> = request
            .figures
            .iter()
            .map(|f| {
                Figure::new(
                    request.manual_id.clone(),
                    request.tenant_id.clone(),
                    f.page_number,
                    f.storage_url.clone(),
                )
            })
            .collect();
        if !figures.is_empty() {
            self.figure_repository
                .save_batch(&figures)
                .await
                .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;
        }

        let progress = IngestionProgress::new(
            request.manual_id.clone(),
            items.len() as i32,
            figures.len() as i32,
        );
        self.progress_repository
            .upsert(&progress)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        info!(
            manual_id = %request.manual_id,
            pages = request.pages.len(),
            chunks = items.len(),
            figures = figures.len(),
            "Manual registered for ingestion"
        );

        Ok(IntakeSummary {
            page_count,
            queued_chunks: items.len(),
            queued_figures: figures.len(),
        })
    }

    /// Claim and process one batch of pending queue items. Item failures are
    /// isolated: they mark the item failed and the batch carries on. Only a
    /// failed claim aborts the job.
    pub async fn process_batch(
        &self,
        manual_id: &str,
    ) -> Result<BatchOutcome, IngestionServiceError> {
        let items = match self
            .queue_repository
            .lock_batch(manual_id, self.config.batch_size)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                let reason = format!("failed to claim queue batch: {}", e);
                warn!(manual_id = %manual_id, error = %e, "Batch claim failed, failing job");
                self.mark_job_failed(manual_id, &reason).await;
                return Err(IngestionServiceError::JobFailed(reason));
            }
        };

        let mut processed = 0usize;
        let mut failed = 0usize;

        if !items.is_empty() {
            let outcomes: Vec<bool> = stream::iter(items)
                .map(|item| self.process_item(item))
                .buffer_unordered(self.config.max_in_flight)
                .collect()
                .await;
            processed = outcomes.iter().filter(|ok| **ok).count();
            failed = outcomes.len() - processed;
        }

        let remaining_pending = self
            .queue_repository
            .count_by_status(manual_id, QueueStatus::Pending)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        self.update_progress(manual_id, remaining_pending).await?;

        info!(
            manual_id = %manual_id,
            processed,
            failed,
            remaining_pending,
            "Ingestion batch finished"
        );

        Ok(BatchOutcome {
            processed,
            failed,
            remaining_pending,
        })
    }

    /// Flip failed queue items back to pending for another pass.
    pub async fn retry_failed(&self, manual_id: &str) -> Result<i64, IngestionServiceError> {
        let requeued = self
            .queue_repository
            .requeue_failed(manual_id)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;
        info!(manual_id = %manual_id, requeued, "Requeued failed chunks");
        Ok(requeued)
    }

    async fn process_item(&self, item: ChunkQueueItem) -> bool {
        match self.embed_and_store(&item).await {
            Ok(()) => match self.queue_repository.mark_done(item.id()).await {
                Ok(()) => true,
                Err(e) => {
                    warn!(item_id = %item.id(), error = %e, "Could not mark queue item done");
                    false
                }
            },
            Err(reason) => {
                warn!(item_id = %item.id(), error = %reason, "Queue item failed");
                if let Err(e) = self.queue_repository.mark_failed(item.id(), &reason).await {
                    warn!(item_id = %item.id(), error = %e, "Could not mark queue item failed");
                }
                false
            }
        }
    }

    async fn embed_and_store(&self, item: &ChunkQueueItem) -> Result<(), String> {
        let text = truncate_for_embedding(item.content());
        let response = self
            .embedding_provider
            .generate_embedding(&text)
            .await
            .map_err(|e| e.to_string())?;

        let flags = detect_flags(item.content());
        let section_type = classify_section(item.menu_path());
        let heading = item
            .menu_path()
            .and_then(|p| p.rsplit('>').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());

        // The queue item pre-allocated the chunk's identity so retries land
        // on the same row.
        let chunk = ManualChunk::from_database(
            item.chunk_id(),
            item.manual_id().to_string(),
            item.tenant_id().to_string(),
            item.content().to_string(),
            item.content_hash().to_string(),
            Some(response.embedding),
            item.page_start(),
            item.page_end(),
            item.menu_path().map(|s| s.to_string()),
            heading,
            section_type,
            flags,
            Some(score_chunk(item.content())),
            Utc::now(),
        );

        self.chunk_repository
            .upsert(&chunk)
            .await
            .map_err(|e| e.to_string())
    }

    /// Refresh the progress snapshot and, when nothing is pending anymore,
    /// settle the final state: completed only if zero items ended up failed.
    async fn update_progress(
        &self,
        manual_id: &str,
        remaining_pending: i64,
    ) -> Result<(), IngestionServiceError> {
        let done = self
            .queue_repository
            .count_by_status(manual_id, QueueStatus::Done)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;

        let Some(mut progress) = self
            .progress_repository
            .find_by_manual(manual_id)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?
        else {
            return Ok(());
        };

        progress.record_chunks(done as i32, "Embedding chunks".to_string());

        if remaining_pending == 0 {
            let failed_total = self
                .queue_repository
                .count_by_status(manual_id, QueueStatus::Failed)
                .await
                .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))?;
            if failed_total == 0 {
                progress.finish(
                    IngestionState::Completed,
                    "Ingestion complete".to_string(),
                );
            } else {
                progress.finish(
                    IngestionState::CompletedWithErrors,
                    format!("Ingestion complete, {} chunks failed", failed_total),
                );
            }
        }

        self.progress_repository
            .upsert(&progress)
            .await
            .map_err(|e| IngestionServiceError::RepositoryError(e.to_string()))
    }

    async fn mark_job_failed(&self, manual_id: &str, reason: &str) {
        // Best effort; the claim failure is already the primary error.
        match self.progress_repository.find_by_manual(manual_id).await {
            Ok(Some(mut progress)) => {
                progress.finish(IngestionState::Failed, reason.to_string());
                if let Err(e) = self.progress_repository.upsert(&progress).await {
                    warn!(manual_id = %manual_id, error = %e, "Could not persist failed state");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(manual_id = %manual_id, error = %e, "Could not load progress for failed job");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{
        MockChunkRepository, MockEmbeddingProvider, MockFigureRepository, MockManualRepository,
        MockProgressRepository, MockQueueRepository,
    };
    use crate::domain::entities::QueueStatus;

    fn queue_item(manual_id: &str, index: i32, content: &str) -> ChunkQueueItem {
        ChunkQueueItem::new(
            manual_id.to_string(),
            "t-1".to_string(),
            content.to_string(),
            index,
            Some(estimate_tokens(content)),
            content_hash(content),
            index + 1,
            index + 1,
            Some("Troubleshooting > Cooling".to_string()),
        )
    }

    struct Harness {
        queue: Arc<MockQueueRepository>,
        chunks: Arc<MockChunkRepository>,
        figures: Arc<MockFigureRepository>,
        manuals: Arc<MockManualRepository>,
        progress: Arc<MockProgressRepository>,
        service: IngestionService,
    }

    fn harness(items: Vec<ChunkQueueItem>, embedder: MockEmbeddingProvider) -> Harness {
        let queue = Arc::new(MockQueueRepository::with_items(items));
        let chunks = Arc::new(MockChunkRepository::default());
        let figures = Arc::new(MockFigureRepository::default());
        let manuals = Arc::new(MockManualRepository::default());
        let progress = Arc::new(MockProgressRepository::default());
        let service = IngestionService::new(
            manuals.clone(),
            queue.clone(),
            chunks.clone(),
            figures.clone(),
            progress.clone(),
            Arc::new(embedder),
            IngestionConfig::default(),
        );
        Harness {
            queue,
            chunks,
            figures,
            manuals,
            progress,
            service,
        }
    }

    async fn seed_progress(h: &Harness, manual_id: &str, total_chunks: i32) {
        let snapshot = IngestionProgress::new(manual_id.to_string(), total_chunks, 0);
        h.progress.upsert(&snapshot).await.unwrap();
    }

    #[tokio::test]
    async fn test_register_manual_enqueues_and_dedupes() {
        let h = harness(Vec::new(), MockEmbeddingProvider::new());
        let page = "Check the condenser coils for dust buildup behind the lower grille.";
        let request = IngestRequest {
            manual_id: "m-1".to_string(),
            tenant_id: "t-1".to_string(),
            file_name: "fridge.pdf".to_string(),
            parse_job_id: Some("job-9".to_string()),
            pages: vec![
                PageText {
                    page_number: 1,
                    text: page.to_string(),
                    menu_path: Some("Maintenance".to_string()),
                },
                // Identical text on another page dedupes away.
                PageText {
                    page_number: 2,
                    text: page.to_string(),
                    menu_path: Some("Maintenance".to_string()),
                },
            ],
            figures: vec![FigureRef {
                page_number: 1,
                storage_url: "s3://figures/m-1/p1.png".to_string(),
            }],
        };

        let summary = h.service.register_manual(request).await.unwrap();
        assert_eq!(summary.page_count, 2);
        assert_eq!(summary.queued_chunks, 1);
        assert_eq!(summary.queued_figures, 1);

        assert_eq!(h.queue.items.lock().unwrap().len(), 1);
        assert_eq!(h.figures.figures.lock().unwrap().len(), 1);
        assert!(h.manuals.manuals.lock().unwrap().contains_key("m-1"));

        let progress = h.progress.get("m-1").unwrap();
        assert_eq!(progress.total_chunks(), 1);
        assert_eq!(progress.total_figures(), 1);
        assert_eq!(progress.state(), IngestionState::Pending);
    }

    #[tokio::test]
    async fn test_register_manual_rejects_empty_input() {
        let h = harness(Vec::new(), MockEmbeddingProvider::new());
        let request = IngestRequest {
            manual_id: "".to_string(),
            tenant_id: "t-1".to_string(),
            file_name: "x.pdf".to_string(),
            parse_job_id: None,
            pages: vec![],
            figures: vec![],
        };
        assert!(matches!(
            h.service.register_manual(request).await,
            Err(IngestionServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_large_queue_drains_across_batches() {
        let items: Vec<ChunkQueueItem> = (0..35)
            .map(|i| {
                queue_item(
                    "m-1",
                    i,
                    &format!("Chunk {} explains how to reseat the door gasket properly.", i),
                )
            })
            .collect();
        let h = harness(items, MockEmbeddingProvider::new());
        seed_progress(&h, "m-1", 35).await;

        let first = h.service.process_batch("m-1").await.unwrap();
        assert_eq!(first.processed, 30);
        assert_eq!(first.failed, 0);
        assert_eq!(first.remaining_pending, 5);

        let progress = h.progress.get("m-1").unwrap();
        assert_eq!(progress.state(), IngestionState::Processing);
        assert!(progress.progress_percent() < 100);

        let second = h.service.process_batch("m-1").await.unwrap();
        assert_eq!(second.processed, 5);
        assert_eq!(second.remaining_pending, 0);

        let progress = h.progress.get("m-1").unwrap();
        assert_eq!(progress.state(), IngestionState::Completed);
        assert_eq!(progress.progress_percent(), 100);

        // Every queue item materialized as an embedded chunk row.
        let chunks = h.chunks.chunks.lock().unwrap();
        assert_eq!(chunks.len(), 35);
        assert!(chunks.iter().all(|c| c.has_embedding()));
    }

    #[tokio::test]
    async fn test_concurrent_claims_never_overlap() {
        let items: Vec<ChunkQueueItem> = (0..40)
            .map(|i| {
                queue_item(
                    "m-1",
                    i,
                    &format!("Chunk {} covers compressor start relay diagnostics.", i),
                )
            })
            .collect();
        let queue = Arc::new(MockQueueRepository::with_items(items));

        // Two workers race on the same manual; the claim must hand each item
        // to exactly one of them.
        let (first, second) = tokio::join!(queue.lock_batch("m-1", 30), queue.lock_batch("m-1", 30));
        let first = first.unwrap();
        let second = second.unwrap();

        let first_ids: HashSet<_> = first.iter().map(|i| i.id()).collect();
        let second_ids: HashSet<_> = second.iter().map(|i| i.id()).collect();
        assert!(first_ids.is_disjoint(&second_ids));
        assert_eq!(first_ids.len() + second_ids.len(), 40);
        assert!(first
            .iter()
            .chain(second.iter())
            .all(|i| i.status() == QueueStatus::Processing));

        // Nothing left to claim afterwards.
        assert!(queue.lock_batch("m-1", 30).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_item_is_isolated_and_recorded() {
        let mut items: Vec<ChunkQueueItem> = (0..9)
            .map(|i| queue_item("m-1", i, &format!("Good chunk {} about the water inlet valve.", i)))
            .collect();
        items.insert(
            3,
            queue_item("m-1", 9, "This poison chunk makes the embedding oracle choke."),
        );
        let poison_id = items[3].id();

        let h = harness(items, MockEmbeddingProvider::failing_on("poison"));
        seed_progress(&h, "m-1", 10).await;

        let outcome = h.service.process_batch("m-1").await.unwrap();
        assert_eq!(outcome.processed, 9);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.remaining_pending, 0);

        let failed = h.queue.find(poison_id).unwrap();
        assert_eq!(failed.status(), QueueStatus::Failed);
        assert_eq!(failed.retry_count(), 1);
        assert!(failed.error().is_some());

        // Nine chunks landed; the poison one did not.
        assert_eq!(h.chunks.chunks.lock().unwrap().len(), 9);

        // Not clean, but finished: completed_with_errors, never completed.
        let progress = h.progress.get("m-1").unwrap();
        assert_eq!(progress.state(), IngestionState::CompletedWithErrors);
        assert_eq!(progress.progress_percent(), 100);
    }

    #[tokio::test]
    async fn test_claim_failure_fails_the_job() {
        let items = vec![queue_item("m-1", 0, "A perfectly fine chunk about defrost timers.")];
        let h = harness(items, MockEmbeddingProvider::new());
        seed_progress(&h, "m-1", 1).await;
        h.queue.set_fail_lock(true);

        let result = h.service.process_batch("m-1").await;
        assert!(matches!(result, Err(IngestionServiceError::JobFailed(_))));

        let progress = h.progress.get("m-1").unwrap();
        assert_eq!(progress.state(), IngestionState::Failed);
    }

    #[tokio::test]
    async fn test_retry_failed_requeues_items() {
        let items = vec![queue_item("m-1", 0, "This poison chunk fails first time around.")];
        let item_id = items[0].id();
        let h = harness(items, MockEmbeddingProvider::failing_on("poison"));
        seed_progress(&h, "m-1", 1).await;

        h.service.process_batch("m-1").await.unwrap();
        assert_eq!(h.queue.find(item_id).unwrap().status(), QueueStatus::Failed);

        let requeued = h.service.retry_failed("m-1").await.unwrap();
        assert_eq!(requeued, 1);
        assert_eq!(h.queue.find(item_id).unwrap().status(), QueueStatus::Pending);
    }

    #[tokio::test]
    async fn test_empty_queue_settles_completed() {
        let h = harness(Vec::new(), MockEmbeddingProvider::new());
        seed_progress(&h, "m-1", 0).await;

        let outcome = h.service.process_batch("m-1").await.unwrap();
        assert_eq!(outcome.processed, 0);
        assert_eq!(outcome.remaining_pending, 0);
        assert_eq!(
            h.progress.get("m-1").unwrap().state(),
            IngestionState::Completed
        );
    }
}

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::application::services::{FigureService, IngestionService, ReingestService};
use crate::infrastructure::messaging::{IngestJob, IngestQueue, IngestQueueReceiver};

/// Pulls jobs off the in-process queue and drives the ingestion services.
/// Chunk-batch jobs re-enqueue themselves until the database queue for the
/// manual drains, then chain into figure enrichment.
pub struct BackgroundProcessor {
    job_receiver: Arc<IngestQueueReceiver>,
    job_queue: IngestQueue,
    ingestion_service: Arc<IngestionService>,
    figure_service: Arc<FigureService>,
    reingest_service: Arc<ReingestService>,
    worker_count: usize,
}

impl BackgroundProcessor {
    pub fn new(
        job_receiver: Arc<IngestQueueReceiver>,
        job_queue: IngestQueue,
        ingestion_service: Arc<IngestionService>,
        figure_service: Arc<FigureService>,
        reingest_service: Arc<ReingestService>,
    ) -> Self {
        Self {
            job_receiver,
            job_queue,
            ingestion_service,
            figure_service,
            reingest_service,
            worker_count: 3,
        }
    }

    pub fn with_worker_count(mut self, count: usize) -> Self {
        self.worker_count = count.max(1);
        self
    }

    pub async fn start(&self) {
        info!(workers = self.worker_count, "Starting background processor");

        let mut handles = Vec::new();

        for worker_id in 0..self.worker_count {
            let processor = self.clone_for_worker();
            let handle = tokio::spawn(async move {
                processor.worker_loop(worker_id).await;
            });
            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!(error = %e, "Background worker panicked");
            }
        }
    }

    async fn worker_loop(&self, worker_id: usize) {
        info!(worker_id, "Background worker started");

        while let Some(job) = self.job_receiver.recv().await {
            info!(worker_id, kind = job.kind(), manual_id = %job.manual_id(), "Picked up job");
            self.handle_job(job).await;
        }

        info!(worker_id, "Background worker shutting down");
    }

    async fn handle_job(&self, job: IngestJob) {
        match job {
            IngestJob::ChunkBatch { manual_id } => {
                match self.ingestion_service.process_batch(&manual_id).await {
                    Ok(outcome) => {
                        let next = if outcome.remaining_pending > 0 {
                            IngestJob::ChunkBatch {
                                manual_id: manual_id.clone(),
                            }
                        } else {
                            IngestJob::Figures {
                                manual_id: manual_id.clone(),
                            }
                        };
                        if let Err(e) = self.job_queue.enqueue(next) {
                            error!(manual_id = %manual_id, error = %e, "Could not chain next job");
                        }
                    }
                    Err(e) => {
                        // process_batch already marked the job failed; there
                        // is nothing left to chain.
                        error!(manual_id = %manual_id, error = %e, "Chunk batch failed");
                    }
                }
            }
            IngestJob::Figures { manual_id } => {
                match self.figure_service.enrich_pending(&manual_id).await {
                    Ok(outcome) => {
                        info!(
                            manual_id = %manual_id,
                            processed = outcome.processed,
                            failed = outcome.failed,
                            embedded = outcome.embedded,
                            "Figure enrichment finished"
                        );
                    }
                    Err(e) => {
                        error!(manual_id = %manual_id, error = %e, "Figure enrichment failed");
                    }
                }
            }
            IngestJob::Reingest { manual_id } => {
                match self.reingest_service.reingest(&manual_id).await {
                    Ok(outcome) => {
                        info!(
                            manual_id = %manual_id,
                            chunks_before = outcome.chunks_before,
                            chunks_after = outcome.chunks_after,
                            embed_failures = outcome.embed_failures,
                            figures_reembedded = outcome.figures_reembedded,
                            "Re-ingestion finished"
                        );
                        if outcome.embed_failures > 0 {
                            warn!(
                                manual_id = %manual_id,
                                embed_failures = outcome.embed_failures,
                                "Re-ingestion left chunks without embeddings"
                            );
                        }
                    }
                    Err(e) => {
                        error!(manual_id = %manual_id, error = %e, "Re-ingestion failed");
                    }
                }
            }
        }
    }

    fn clone_for_worker(&self) -> Self {
        Self {
            job_receiver: self.job_receiver.clone(),
            job_queue: self.job_queue.clone(),
            ingestion_service: self.ingestion_service.clone(),
            figure_service: self.figure_service.clone(),
            reingest_service: self.reingest_service.clone(),
            worker_count: self.worker_count,
        }
    }
}

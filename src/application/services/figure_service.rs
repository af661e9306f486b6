use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::ports::embedding_provider::{EmbeddingProvider, truncate_for_embedding};
use crate::application::ports::vision_provider::{VisionExtraction, VisionProvider};
use crate::domain::entities::{Figure, VisionMetadata};
use crate::domain::repositories::{FigureRepository, ProgressRepository};

#[derive(Debug)]
pub enum FigureServiceError {
    RepositoryError(String),
}

impl std::fmt::Display for FigureServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FigureServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for FigureServiceError {}

#[derive(Debug, Clone, Copy)]
pub struct FigureEnrichmentConfig {
    /// Persist a progress checkpoint after this many figures.
    pub checkpoint_every: usize,
    /// Pause after this many figures to stay under vision rate limits.
    pub pause_every: usize,
    pub pause: Duration,
}

impl Default for FigureEnrichmentConfig {
    fn default() -> Self {
        Self {
            checkpoint_every: 5,
            pause_every: 10,
            pause: Duration::from_secs(1),
        }
    }
}

impl FigureEnrichmentConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            checkpoint_every: env_usize("FIGURE_CHECKPOINT_EVERY", defaults.checkpoint_every),
            pause_every: env_usize("FIGURE_PAUSE_EVERY", defaults.pause_every),
            pause: Duration::from_millis(env_u64(
                "FIGURE_PAUSE_MS",
                defaults.pause.as_millis() as u64,
            )),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichmentOutcome {
    pub processed: usize,
    pub failed: usize,
    pub embedded: usize,
}

/// Sequential figure enrichment: vision extraction, then an embedding for
/// figures whose extracted text is worth indexing. One bad figure never
/// takes the run down with it.
pub struct FigureService {
    figure_repository: Arc<dyn FigureRepository>,
    progress_repository: Arc<dyn ProgressRepository>,
    vision_provider: Arc<dyn VisionProvider>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: FigureEnrichmentConfig,
}

impl FigureService {
    pub fn new(
        figure_repository: Arc<dyn FigureRepository>,
        progress_repository: Arc<dyn ProgressRepository>,
        vision_provider: Arc<dyn VisionProvider>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: FigureEnrichmentConfig,
    ) -> Self {
        Self {
            figure_repository,
            progress_repository,
            vision_provider,
            embedding_provider,
            config,
        }
    }

    /// Run enrichment over every pending figure of the manual.
    pub async fn enrich_pending(
        &self,
        manual_id: &str,
    ) -> Result<EnrichmentOutcome, FigureServiceError> {
        let pending = self
            .figure_repository
            .find_pending(manual_id)
            .await
            .map_err(|e| FigureServiceError::RepositoryError(e.to_string()))?;

        let total = pending.len();
        let mut outcome = EnrichmentOutcome {
            processed: 0,
            failed: 0,
            embedded: 0,
        };

        for (index, figure) in pending.into_iter().enumerate() {
            match self.enrich_one(figure).await {
                FigureResult::Enriched { embedded } => {
                    outcome.processed += 1;
                    if embedded {
                        outcome.embedded += 1;
                    }
                }
                FigureResult::Failed => outcome.failed += 1,
                FigureResult::Skipped => {}
            }

            let done = index + 1;
            if done % self.config.checkpoint_every == 0 || done == total {
                self.checkpoint(manual_id, done).await;
            }
            if done % self.config.pause_every == 0 && done < total {
                tokio::time::sleep(self.config.pause).await;
            }
        }

        info!(
            manual_id = %manual_id,
            processed = outcome.processed,
            failed = outcome.failed,
            embedded = outcome.embedded,
            "Figure enrichment finished"
        );

        Ok(outcome)
    }

    async fn enrich_one(&self, mut figure: Figure) -> FigureResult {
        if figure.start_processing().is_err() {
            // Claimed by a concurrent run since we listed it.
            return FigureResult::Skipped;
        }
        if let Err(e) = self.figure_repository.update(&figure).await {
            warn!(figure_id = %figure.id(), error = %e, "Could not persist processing claim");
            return FigureResult::Skipped;
        }

        let result = match self.vision_provider.analyze_figure(figure.storage_url()).await {
            Ok(extraction) => {
                apply_extraction(&mut figure, extraction);
                let embedded = self.embed_figure(&mut figure).await;
                FigureResult::Enriched { embedded }
            }
            Err(e) => {
                warn!(figure_id = %figure.id(), error = %e, "Vision extraction failed");
                figure.fail_extraction(e.to_string());
                FigureResult::Failed
            }
        };

        if let Err(e) = self.figure_repository.update(&figure).await {
            warn!(figure_id = %figure.id(), error = %e, "Could not persist enriched figure");
        }
        result
    }

    /// Embed the figure's retrieval text if there is any worth embedding. An
    /// embedding failure downgrades the figure to text-only retrieval; the
    /// extraction itself still counts as a success.
    async fn embed_figure(&self, figure: &mut Figure) -> bool {
        let Some(text) = figure.embeddable_text() else {
            return false;
        };
        match self
            .embedding_provider
            .generate_embedding(&truncate_for_embedding(&text))
            .await
        {
            Ok(response) => {
                figure.set_embedding(text, response.embedding);
                true
            }
            Err(e) => {
                warn!(figure_id = %figure.id(), error = %e, "Figure embedding failed");
                false
            }
        }
    }

    async fn checkpoint(&self, manual_id: &str, done: usize) {
        match self.progress_repository.find_by_manual(manual_id).await {
            Ok(Some(mut progress)) => {
                progress.record_figures(done as i32, "Enriching figures".to_string());
                if let Err(e) = self.progress_repository.upsert(&progress).await {
                    warn!(manual_id = %manual_id, error = %e, "Could not checkpoint figure progress");
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!(manual_id = %manual_id, error = %e, "Could not load progress for checkpoint");
            }
        }
    }
}

enum FigureResult {
    Enriched { embedded: bool },
    Failed,
    Skipped,
}

fn apply_extraction(figure: &mut Figure, extraction: VisionExtraction) {
    let metadata = VisionMetadata {
        figure_type: extraction.figure_type,
        detected_components: extraction.detected_components,
        semantic_tags: extraction.semantic_tags,
        entities: extraction.entities,
        technical_complexity: extraction.technical_complexity,
        image_quality: extraction.image_quality,
    };
    figure.complete_extraction(
        extraction.extracted_text,
        extraction.text_confidence,
        extraction.caption,
        metadata,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{
        MockEmbeddingProvider, MockFigureRepository, MockProgressRepository, MockVisionProvider,
    };
    use crate::domain::entities::{ImageQuality, IngestionProgress, OcrStatus, TextConfidence};

    fn figures(manual_id: &str, count: usize) -> Vec<Figure> {
        (0..count)
            .map(|i| {
                Figure::new(
                    manual_id.to_string(),
                    "t-1".to_string(),
                    (i + 1) as i32,
                    format!("s3://figures/{}/p{}.png", manual_id, i + 1),
                )
            })
            .collect()
    }

    fn no_pause() -> FigureEnrichmentConfig {
        FigureEnrichmentConfig {
            checkpoint_every: 5,
            pause_every: 10,
            pause: Duration::from_millis(0),
        }
    }

    fn service(
        repo: Arc<MockFigureRepository>,
        progress: Arc<MockProgressRepository>,
        vision: MockVisionProvider,
        embedder: MockEmbeddingProvider,
    ) -> FigureService {
        FigureService::new(
            repo,
            progress,
            Arc::new(vision),
            Arc::new(embedder),
            no_pause(),
        )
    }

    #[tokio::test]
    async fn test_enrichment_embeds_and_checkpoints() {
        let repo = Arc::new(MockFigureRepository::with_figures(figures("m-1", 12)));
        let progress = Arc::new(MockProgressRepository::default());
        progress
            .upsert(&IngestionProgress::new("m-1".to_string(), 0, 12))
            .await
            .unwrap();

        let svc = service(
            repo.clone(),
            progress.clone(),
            MockVisionProvider::extracting(
                "Wiring diagram: compressor relay on terminal block J3",
                ImageQuality::Acceptable,
            ),
            MockEmbeddingProvider::new(),
        );

        let outcome = svc.enrich_pending("m-1").await.unwrap();
        assert_eq!(outcome.processed, 12);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.embedded, 12);

        let stored = repo.figures.lock().unwrap();
        assert!(stored.iter().all(|f| f.ocr_status() == OcrStatus::Success));
        assert!(stored.iter().all(|f| f.embedding().is_some()));
        assert!(stored.iter().all(|f| f.quality_score() == Some(0.75)));

        let snapshot = progress.get("m-1").unwrap();
        assert_eq!(snapshot.figures_processed(), 12);
    }

    #[tokio::test]
    async fn test_one_bad_figure_does_not_stop_the_run() {
        let mut figs = figures("m-1", 3);
        figs[1] = Figure::new(
            "m-1".to_string(),
            "t-1".to_string(),
            2,
            "s3://figures/m-1/bad-scan.png".to_string(),
        );
        let bad_id = figs[1].id();

        let repo = Arc::new(MockFigureRepository::with_figures(figs));
        let progress = Arc::new(MockProgressRepository::default());
        let svc = service(
            repo.clone(),
            progress,
            MockVisionProvider::failing_on(
                "bad-scan",
                "Exploded view of the auger motor assembly",
                ImageQuality::Sharp,
            ),
            MockEmbeddingProvider::new(),
        );

        let outcome = svc.enrich_pending("m-1").await.unwrap();
        assert_eq!(outcome.processed, 2);
        assert_eq!(outcome.failed, 1);

        let stored = repo.figures.lock().unwrap();
        let bad = stored.iter().find(|f| f.id() == bad_id).unwrap();
        assert_eq!(bad.ocr_status(), OcrStatus::Failed);
        assert!(bad.ocr_error().is_some());
    }

    #[tokio::test]
    async fn test_embedding_failure_keeps_extraction() {
        let repo = Arc::new(MockFigureRepository::with_figures(figures("m-1", 1)));
        let progress = Arc::new(MockProgressRepository::default());
        let svc = service(
            repo.clone(),
            progress,
            MockVisionProvider::extracting(
                "poison text the embedding oracle rejects",
                ImageQuality::Sharp,
            ),
            MockEmbeddingProvider::failing_on("poison"),
        );

        let outcome = svc.enrich_pending("m-1").await.unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.embedded, 0);

        let stored = repo.figures.lock().unwrap();
        assert_eq!(stored[0].ocr_status(), OcrStatus::Success);
        assert!(stored[0].embedding().is_none());
    }

    #[tokio::test]
    async fn test_unreadable_text_is_not_embedded() {
        let repo = Arc::new(MockFigureRepository::with_figures(figures("m-1", 1)));
        let progress = Arc::new(MockProgressRepository::default());

        let mut vision = MockVisionProvider::extracting("illegible scribbles", ImageQuality::Damaged);
        vision.extraction.text_confidence = TextConfidence::None;
        vision.extraction.caption = None;

        let embedder = MockEmbeddingProvider::new();
        let svc = service(repo.clone(), progress, vision, embedder);

        let outcome = svc.enrich_pending("m-1").await.unwrap();
        assert_eq!(outcome.processed, 1);
        assert_eq!(outcome.embedded, 0);
        assert!(repo.figures.lock().unwrap()[0].embedding().is_none());
    }
}

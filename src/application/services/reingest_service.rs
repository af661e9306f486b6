use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::application::ports::embedding_provider::{EmbeddingProvider, truncate_for_embedding};
use crate::application::services::chunk_metadata::{classify_section, detect_flags, score_chunk};
use crate::application::services::chunking::{ChunkingConfig, content_hash, split_with_overlap};
use crate::domain::entities::{Figure, ManualChunk, OcrStatus};
use crate::domain::repositories::{
    ChunkRepository, FigureRepository, ManualRepository,
};

#[derive(Debug)]
pub enum ReingestServiceError {
    ValidationError(String),
    RepositoryError(String),
}

impl std::fmt::Display for ReingestServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReingestServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ReingestServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
        }
    }
}

impl std::error::Error for ReingestServiceError {}

#[derive(Debug, Clone, Copy)]
pub struct ReingestConfig {
    pub chunking: ChunkingConfig,
    /// Gap between embedding calls so a full re-embed does not hammer the
    /// oracle.
    pub embed_throttle: Duration,
    /// Chunk rows inserted per statement during the swap.
    pub insert_batch_size: usize,
    /// Page radius for figure context chunks.
    pub figure_context_radius: i32,
}

impl Default for ReingestConfig {
    fn default() -> Self {
        Self {
            chunking: ChunkingConfig::default(),
            embed_throttle: Duration::from_millis(100),
            insert_batch_size: 100,
            figure_context_radius: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReingestOutcome {
    pub page_count: i32,
    pub chunks_before: usize,
    pub chunks_after: usize,
    pub embed_failures: usize,
    pub figures_reembedded: usize,
}

/// Rebuilds a manual's index in place: re-chunk the stored text with the
/// current chunking settings, re-embed everything, swap the chunk set in one
/// transaction, then refresh figure embeddings with nearby-page context.
pub struct ReingestService {
    manual_repository: Arc<dyn ManualRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
    figure_repository: Arc<dyn FigureRepository>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: ReingestConfig,
}

impl ReingestService {
    pub fn new(
        manual_repository: Arc<dyn ManualRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
        figure_repository: Arc<dyn FigureRepository>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: ReingestConfig,
    ) -> Self {
        Self {
            manual_repository,
            chunk_repository,
            figure_repository,
            embedding_provider,
            config,
        }
    }

    pub async fn reingest(&self, manual_id: &str) -> Result<ReingestOutcome, ReingestServiceError> {
        let existing = self
            .chunk_repository
            .find_by_manual(manual_id)
            .await
            .map_err(|e| ReingestServiceError::RepositoryError(e.to_string()))?;
        if existing.is_empty() {
            return Err(ReingestServiceError::ValidationError(format!(
                "Manual {} has no chunks to re-ingest",
                manual_id
            )));
        }

        // The stored chunks are the source of truth for the page count; the
        // original upload metadata may be stale.
        let page_count = self
            .chunk_repository
            .max_page_end(manual_id)
            .await
            .map_err(|e| ReingestServiceError::RepositoryError(e.to_string()))?
            .unwrap_or(0);
        self.manual_repository
            .update_page_count(manual_id, page_count)
            .await
            .map_err(|e| ReingestServiceError::RepositoryError(e.to_string()))?;

        let mut rebuilt = rebuild_chunks(&existing, page_count, self.config.chunking);

        let mut embed_failures = 0usize;
        for (i, chunk) in rebuilt.iter_mut().enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config.embed_throttle).await;
            }
            match self
                .embedding_provider
                .generate_embedding(&truncate_for_embedding(chunk.content()))
                .await
            {
                Ok(response) => chunk.set_embedding(response.embedding),
                Err(e) => {
                    warn!(error = %e, "Re-embed failed for chunk, keeping text-only row");
                    embed_failures += 1;
                }
            }
        }

        let chunks_after = self
            .chunk_repository
            .replace_for_manual(manual_id, &rebuilt, self.config.insert_batch_size)
            .await
            .map_err(|e| ReingestServiceError::RepositoryError(e.to_string()))?;

        let figures_reembedded = self.reembed_figures(manual_id).await?;

        info!(
            manual_id = %manual_id,
            page_count,
            chunks_before = existing.len(),
            chunks_after,
            embed_failures,
            figures_reembedded,
            "Re-ingestion finished"
        );

        Ok(ReingestOutcome {
            page_count,
            chunks_before: existing.len(),
            chunks_after,
            embed_failures,
            figures_reembedded,
        })
    }

    /// Refresh embeddings for successfully extracted figures, mixing the
    /// caption and OCR text with chunk content from nearby pages.
    async fn reembed_figures(&self, manual_id: &str) -> Result<usize, ReingestServiceError> {
        let figures = self
            .figure_repository
            .find_by_manual(manual_id)
            .await
            .map_err(|e| ReingestServiceError::RepositoryError(e.to_string()))?;

        let mut reembedded = 0usize;
        for mut figure in figures {
            if figure.ocr_status() != OcrStatus::Success {
                continue;
            }
            let context = self
                .chunk_repository
                .find_by_page_window(
                    manual_id,
                    figure.page_number(),
                    self.config.figure_context_radius,
                )
                .await
                .map_err(|e| ReingestServiceError::RepositoryError(e.to_string()))?;

            let Some(text) = figure_embedding_text(&figure, &context) else {
                continue;
            };

            if reembedded > 0 {
                tokio::time::sleep(self.config.embed_throttle).await;
            }
            match self
                .embedding_provider
                .generate_embedding(&truncate_for_embedding(&text))
                .await
            {
                Ok(response) => {
                    figure.set_embedding(text, response.embedding);
                    if let Err(e) = self.figure_repository.update(&figure).await {
                        warn!(figure_id = %figure.id(), error = %e, "Could not persist figure re-embed");
                    } else {
                        reembedded += 1;
                    }
                }
                Err(e) => {
                    warn!(figure_id = %figure.id(), error = %e, "Figure re-embed failed");
                }
            }
        }
        Ok(reembedded)
    }
}

/// Pure index rebuild: drop chunks pointing past the manual's end, re-split
/// the surviving text, and dedupe by content hash. Embeddings are attached
/// by the caller.
pub fn rebuild_chunks(
    existing: &[ManualChunk],
    page_count: i32,
    config: ChunkingConfig,
) -> Vec<ManualChunk> {
    let mut sources: Vec<&ManualChunk> = existing.iter().collect();
    sources.sort_by_key(|c| (c.page_start(), c.page_end()));

    let mut seen = HashSet::new();
    let mut rebuilt = Vec::new();
    for source in sources {
        if !source.page_range_valid(page_count) {
            continue;
        }
        for piece in split_with_overlap(source.content(), config) {
            let hash = content_hash(&piece);
            if !seen.insert(hash.clone()) {
                continue;
            }
            let flags = detect_flags(&piece);
            let section_type = classify_section(source.menu_path());
            let quality = score_chunk(&piece);
            let mut chunk = ManualChunk::new(
                source.manual_id().to_string(),
                source.tenant_id().to_string(),
                piece,
                hash,
                source.page_start(),
                source.page_end(),
                source.menu_path().map(|s| s.to_string()),
                source.section_heading().map(|s| s.to_string()),
                section_type,
                flags,
            );
            chunk.set_quality_score(quality);
            rebuilt.push(chunk);
        }
    }
    rebuilt
}

/// Combined caption, OCR text, and nearby-chunk context for a figure's
/// retrieval embedding. None when there is nothing substantive to embed.
pub fn figure_embedding_text(figure: &Figure, context: &[ManualChunk]) -> Option<String> {
    let mut parts: Vec<String> = Vec::new();
    if let Some(caption) = figure.caption_text() {
        parts.push(caption.to_string());
    }
    if let Some(text) = figure.ocr_text() {
        parts.push(text.to_string());
    }
    for chunk in context.iter().take(2) {
        parts.push(chunk.content().chars().take(300).collect());
    }
    let combined = parts.join("\n");
    if combined.trim().chars().count() >= 10 {
        Some(combined)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{
        MockChunkRepository, MockEmbeddingProvider, MockFigureRepository, MockManualRepository,
    };
    use crate::domain::entities::{
        ChunkFlags, ImageQuality, Manual, SectionType, TextConfidence, VisionMetadata,
    };
    use crate::domain::repositories::ManualRepository;

    fn source_chunk(content: &str, page_start: i32, page_end: i32) -> ManualChunk {
        ManualChunk::new(
            "m-1".to_string(),
            "t-1".to_string(),
            content.to_string(),
            content_hash(content),
            page_start,
            page_end,
            Some("Troubleshooting > Compressor".to_string()),
            None,
            SectionType::Troubleshooting,
            ChunkFlags::default(),
        )
    }

    fn fast_config() -> ReingestConfig {
        ReingestConfig {
            embed_throttle: Duration::from_millis(0),
            ..ReingestConfig::default()
        }
    }

    #[test]
    fn test_rebuild_drops_out_of_range_and_dedupes() {
        let body = "Listen for the start relay click, then measure resistance across \
                    the run winding. Anything above 10 ohms means a failing winding.";
        let chunks = vec![
            source_chunk(body, 3, 3),
            // Same text again: deduped away.
            source_chunk(body, 4, 4),
            // Points past the end of the manual: dropped.
            source_chunk("A stale chunk from a mis-parsed appendix page, long enough to keep.", 11, 11),
        ];

        let rebuilt = rebuild_chunks(&chunks, 10, ChunkingConfig::default());
        assert_eq!(rebuilt.len(), 1);
        assert_eq!(rebuilt[0].page_start(), 3);
        assert_eq!(rebuilt[0].section_type(), SectionType::Troubleshooting);
        assert!(rebuilt[0].quality_score().is_some());
    }

    #[test]
    fn test_rebuild_resplits_oversized_chunks() {
        let long_body = "inspect the evaporator coil for frost patterns and note any bare spots "
            .repeat(20);
        let rebuilt = rebuild_chunks(
            &[source_chunk(&long_body, 5, 6)],
            10,
            ChunkingConfig::default(),
        );
        assert!(rebuilt.len() > 1);
        for chunk in &rebuilt {
            assert!(chunk.character_count() <= 400);
            assert_eq!(chunk.page_start(), 5);
            assert_eq!(chunk.page_end(), 6);
        }
    }

    #[test]
    fn test_figure_embedding_text_combines_sources() {
        let mut figure = Figure::new(
            "m-1".to_string(),
            "t-1".to_string(),
            4,
            "s3://figures/m-1/p4.png".to_string(),
        );
        figure.start_processing().unwrap();
        figure.complete_extraction(
            Some("R1: 10k, R2: 4.7k".to_string()),
            TextConfidence::High,
            Some("Control board resistor layout".to_string()),
            VisionMetadata {
                figure_type: "pcb_layout".to_string(),
                detected_components: vec![],
                semantic_tags: vec![],
                entities: serde_json::json!({}),
                technical_complexity: "high".to_string(),
                image_quality: ImageQuality::Sharp,
            },
        );

        let context = vec![source_chunk(
            "The control board lives behind the rear access panel above the compressor.",
            4,
            4,
        )];
        let text = figure_embedding_text(&figure, &context).unwrap();
        assert!(text.contains("resistor layout"));
        assert!(text.contains("R1: 10k"));
        assert!(text.contains("rear access panel"));

        let bare = Figure::new("m-1".to_string(), "t-1".to_string(), 4, "url".to_string());
        assert!(figure_embedding_text(&bare, &[]).is_none());
    }

    #[tokio::test]
    async fn test_reingest_swaps_and_reembeds() {
        let long_body =
            "check the door gasket seal with a dollar bill at several points around the frame "
                .repeat(15);
        let chunks = Arc::new(MockChunkRepository::with_chunks(vec![
            source_chunk(&long_body, 2, 2),
            source_chunk(
                "Verify 120V at the outlet before any further electrical diagnosis.",
                9,
                9,
            ),
        ]));
        let manuals = Arc::new(MockManualRepository::default());
        manuals
            .upsert(&Manual::new(
                "m-1".to_string(),
                "t-1".to_string(),
                "fridge.pdf".to_string(),
                None,
                50,
            ))
            .await
            .unwrap();

        let svc = ReingestService::new(
            manuals.clone(),
            chunks.clone(),
            Arc::new(MockFigureRepository::default()),
            Arc::new(MockEmbeddingProvider::new()),
            fast_config(),
        );

        let outcome = svc.reingest("m-1").await.unwrap();
        assert_eq!(outcome.chunks_before, 2);
        assert!(outcome.chunks_after > 2);
        assert_eq!(outcome.embed_failures, 0);
        // Page count recomputed from the chunks, not the stale upload value.
        assert_eq!(outcome.page_count, 9);
        assert_eq!(
            manuals.manuals.lock().unwrap().get("m-1").unwrap().page_count(),
            9
        );

        let stored = chunks.chunks.lock().unwrap();
        assert_eq!(stored.len(), outcome.chunks_after);
        assert!(stored.iter().all(|c| c.has_embedding()));
    }

    #[tokio::test]
    async fn test_reingest_refreshes_figure_embeddings() {
        let chunks = Arc::new(MockChunkRepository::with_chunks(vec![source_chunk(
            "Thermistor resistance table: 16.3k ohms at 32F, 11.9k at 50F, 8.8k at 68F.",
            4,
            4,
        )]));
        let manuals = Arc::new(MockManualRepository::default());
        manuals
            .upsert(&Manual::new(
                "m-1".to_string(),
                "t-1".to_string(),
                "fridge.pdf".to_string(),
                None,
                10,
            ))
            .await
            .unwrap();

        let mut figure = Figure::new(
            "m-1".to_string(),
            "t-1".to_string(),
            5,
            "s3://figures/m-1/p5.png".to_string(),
        );
        figure.start_processing().unwrap();
        figure.complete_extraction(
            Some("Thermistor location: left evaporator wall".to_string()),
            TextConfidence::Medium,
            Some("Sensor placement diagram".to_string()),
            VisionMetadata {
                figure_type: "diagram".to_string(),
                detected_components: vec![],
                semantic_tags: vec![],
                entities: serde_json::json!({}),
                technical_complexity: "low".to_string(),
                image_quality: ImageQuality::Acceptable,
            },
        );
        let figures = Arc::new(MockFigureRepository::with_figures(vec![figure]));

        let svc = ReingestService::new(
            manuals,
            chunks,
            figures.clone(),
            Arc::new(MockEmbeddingProvider::new()),
            fast_config(),
        );

        let outcome = svc.reingest("m-1").await.unwrap();
        assert_eq!(outcome.figures_reembedded, 1);

        let stored = figures.figures.lock().unwrap();
        assert!(stored[0].embedding().is_some());
        // The refreshed embedding text folds in the nearby chunk.
        assert!(stored[0].embedding_text().unwrap().contains("resistance table"));
    }
}

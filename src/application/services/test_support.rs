//! In-memory fakes for service tests. The queue fake claims batches under a
//! single lock, matching the exactly-once guarantee the real repository gets
//! from `FOR UPDATE SKIP LOCKED`.

use async_trait::async_trait;
use pgvector::Vector;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use uuid::Uuid;

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, EmbeddingProviderError, EmbeddingResponse,
};
use crate::application::ports::generation_provider::{
    GenerationProvider, GenerationProviderError, GenerationRequest, GenerationResponse,
};
use crate::application::ports::vision_provider::{
    VisionExtraction, VisionProvider, VisionProviderError,
};
use crate::application::services::search_service::{
    SearchEngine, SearchQuery, SearchServiceError,
};
use crate::domain::entities::{
    ChunkQueueItem, Figure, ImageQuality, IngestionProgress, Manual, ManualChunk, QueryLog,
    QueueStatus, RetrievalResult, TextConfidence,
};
use crate::domain::repositories::chunk_repository::{
    ChunkRepository, ChunkRepositoryError, ChunkVectorHit,
};
use crate::domain::repositories::figure_repository::{
    FigureRepository, FigureRepositoryError, FigureVectorHit,
};
use crate::domain::repositories::manual_repository::{ManualRepository, ManualRepositoryError};
use crate::domain::repositories::progress_repository::{
    ProgressRepository, ProgressRepositoryError,
};
use crate::domain::repositories::query_log_repository::{
    QueryLogRepository, QueryLogRepositoryError,
};
use crate::domain::repositories::queue_repository::{QueueRepository, QueueRepositoryError};

#[derive(Default)]
pub struct MockQueueRepository {
    pub items: Mutex<Vec<ChunkQueueItem>>,
    pub fail_lock: Mutex<bool>,
}

impl MockQueueRepository {
    pub fn with_items(items: Vec<ChunkQueueItem>) -> Self {
        Self {
            items: Mutex::new(items),
            fail_lock: Mutex::new(false),
        }
    }

    pub fn set_fail_lock(&self, fail: bool) {
        *self.fail_lock.lock().unwrap() = fail;
    }

    pub fn find(&self, id: Uuid) -> Option<ChunkQueueItem> {
        self.items.lock().unwrap().iter().find(|i| i.id() == id).cloned()
    }
}

#[async_trait]
impl QueueRepository for MockQueueRepository {
    async fn enqueue_batch(
        &self,
        items: &[ChunkQueueItem],
    ) -> Result<usize, QueueRepositoryError> {
        let mut guard = self.items.lock().unwrap();
        guard.extend(items.iter().cloned());
        Ok(items.len())
    }

    async fn lock_batch(
        &self,
        manual_id: &str,
        limit: i64,
    ) -> Result<Vec<ChunkQueueItem>, QueueRepositoryError> {
        if *self.fail_lock.lock().unwrap() {
            return Err(QueueRepositoryError::DatabaseError(
                "queue table unavailable".to_string(),
            ));
        }
        let mut guard = self.items.lock().unwrap();
        let mut claimed = Vec::new();
        for item in guard.iter_mut() {
            if claimed.len() as i64 >= limit {
                break;
            }
            if item.manual_id() == manual_id && item.status() == QueueStatus::Pending {
                *item = ChunkQueueItem::from_database(
                    item.id(),
                    item.chunk_id(),
                    item.manual_id().to_string(),
                    item.tenant_id().to_string(),
                    item.content().to_string(),
                    item.chunk_index(),
                    item.token_count(),
                    item.content_hash().to_string(),
                    item.page_start(),
                    item.page_end(),
                    item.menu_path().map(|s| s.to_string()),
                    QueueStatus::Processing,
                    item.retry_count(),
                    item.error().map(|s| s.to_string()),
                    item.created_at(),
                );
                claimed.push(item.clone());
            }
        }
        Ok(claimed)
    }

    async fn mark_done(&self, item_id: Uuid) -> Result<(), QueueRepositoryError> {
        let mut guard = self.items.lock().unwrap();
        let item = guard
            .iter_mut()
            .find(|i| i.id() == item_id)
            .ok_or_else(|| QueueRepositoryError::ValidationError("unknown item".to_string()))?;
        item.mark_done()
            .map_err(QueueRepositoryError::ValidationError)
    }

    async fn mark_failed(&self, item_id: Uuid, error: &str) -> Result<(), QueueRepositoryError> {
        let mut guard = self.items.lock().unwrap();
        let item = guard
            .iter_mut()
            .find(|i| i.id() == item_id)
            .ok_or_else(|| QueueRepositoryError::ValidationError("unknown item".to_string()))?;
        item.mark_failed(error.to_string())
            .map_err(QueueRepositoryError::ValidationError)
    }

    async fn count_by_status(
        &self,
        manual_id: &str,
        status: QueueStatus,
    ) -> Result<i64, QueueRepositoryError> {
        let guard = self.items.lock().unwrap();
        Ok(guard
            .iter()
            .filter(|i| i.manual_id() == manual_id && i.status() == status)
            .count() as i64)
    }

    async fn requeue_failed(&self, manual_id: &str) -> Result<i64, QueueRepositoryError> {
        let mut guard = self.items.lock().unwrap();
        let mut requeued = 0;
        for item in guard.iter_mut() {
            if item.manual_id() == manual_id && item.status() == QueueStatus::Failed {
                *item = ChunkQueueItem::from_database(
                    item.id(),
                    item.chunk_id(),
                    item.manual_id().to_string(),
                    item.tenant_id().to_string(),
                    item.content().to_string(),
                    item.chunk_index(),
                    item.token_count(),
                    item.content_hash().to_string(),
                    item.page_start(),
                    item.page_end(),
                    item.menu_path().map(|s| s.to_string()),
                    QueueStatus::Pending,
                    item.retry_count(),
                    item.error().map(|s| s.to_string()),
                    item.created_at(),
                );
                requeued += 1;
            }
        }
        Ok(requeued)
    }

    async fn delete_by_manual(&self, manual_id: &str) -> Result<i64, QueueRepositoryError> {
        let mut guard = self.items.lock().unwrap();
        let before = guard.len();
        guard.retain(|i| i.manual_id() != manual_id);
        Ok((before - guard.len()) as i64)
    }
}

#[derive(Default)]
pub struct MockChunkRepository {
    pub chunks: Mutex<Vec<ManualChunk>>,
}

impl MockChunkRepository {
    pub fn with_chunks(chunks: Vec<ManualChunk>) -> Self {
        Self {
            chunks: Mutex::new(chunks),
        }
    }
}

#[async_trait]
impl ChunkRepository for MockChunkRepository {
    async fn upsert(&self, chunk: &ManualChunk) -> Result<(), ChunkRepositoryError> {
        let mut guard = self.chunks.lock().unwrap();
        if let Some(existing) = guard
            .iter_mut()
            .find(|c| c.manual_id() == chunk.manual_id() && c.content_hash() == chunk.content_hash())
        {
            *existing = chunk.clone();
        } else {
            guard.push(chunk.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ManualChunk>, ChunkRepositoryError> {
        Ok(self.chunks.lock().unwrap().iter().find(|c| c.id() == id).cloned())
    }

    async fn find_by_manual(
        &self,
        manual_id: &str,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.manual_id() == manual_id)
            .cloned()
            .collect())
    }

    async fn count_by_manual(&self, manual_id: &str) -> Result<i64, ChunkRepositoryError> {
        Ok(self.find_by_manual(manual_id).await?.len() as i64)
    }

    async fn max_page_end(&self, manual_id: &str) -> Result<Option<i32>, ChunkRepositoryError> {
        Ok(self
            .find_by_manual(manual_id)
            .await?
            .iter()
            .map(|c| c.page_end())
            .max())
    }

    async fn replace_for_manual(
        &self,
        manual_id: &str,
        chunks: &[ManualChunk],
        _insert_batch_size: usize,
    ) -> Result<usize, ChunkRepositoryError> {
        let mut guard = self.chunks.lock().unwrap();
        guard.retain(|c| c.manual_id() != manual_id);
        guard.extend(chunks.iter().cloned());
        Ok(chunks.len())
    }

    async fn vector_search(
        &self,
        _query: &Vector,
        manual_id: Option<&str>,
        _tenant_id: Option<&str>,
        _min_similarity: f32,
        limit: i64,
    ) -> Result<Vec<ChunkVectorHit>, ChunkRepositoryError> {
        // Every embedded chunk matches with a fixed similarity; enough for
        // pipeline-shape tests.
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.has_embedding())
            .filter(|c| manual_id.is_none_or(|m| c.manual_id() == m))
            .take(limit as usize)
            .map(|c| ChunkVectorHit {
                chunk: c.clone(),
                similarity: 0.8,
            })
            .collect())
    }

    async fn lexical_search(
        &self,
        terms: &[String],
        manual_id: Option<&str>,
        _tenant_id: Option<&str>,
        limit: i64,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| manual_id.is_none_or(|m| c.manual_id() == m))
            .filter(|c| {
                let content = c.content().to_lowercase();
                terms.iter().any(|t| content.contains(t.as_str()))
            })
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn find_by_page_window(
        &self,
        manual_id: &str,
        page: i32,
        radius: i32,
    ) -> Result<Vec<ManualChunk>, ChunkRepositoryError> {
        Ok(self
            .chunks
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.manual_id() == manual_id)
            .filter(|c| c.page_end() >= page - radius && c.page_start() <= page + radius)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct MockFigureRepository {
    pub figures: Mutex<Vec<Figure>>,
}

impl MockFigureRepository {
    pub fn with_figures(figures: Vec<Figure>) -> Self {
        Self {
            figures: Mutex::new(figures),
        }
    }
}

#[async_trait]
impl FigureRepository for MockFigureRepository {
    async fn save_batch(&self, figures: &[Figure]) -> Result<usize, FigureRepositoryError> {
        let mut guard = self.figures.lock().unwrap();
        guard.extend(figures.iter().cloned());
        Ok(figures.len())
    }

    async fn update(&self, figure: &Figure) -> Result<(), FigureRepositoryError> {
        let mut guard = self.figures.lock().unwrap();
        let existing = guard
            .iter_mut()
            .find(|f| f.id() == figure.id())
            .ok_or_else(|| FigureRepositoryError::ValidationError("unknown figure".to_string()))?;
        *existing = figure.clone();
        Ok(())
    }

    async fn find_pending(&self, manual_id: &str) -> Result<Vec<Figure>, FigureRepositoryError> {
        Ok(self
            .figures
            .lock()
            .unwrap()
            .iter()
            .filter(|f| {
                f.manual_id() == manual_id
                    && f.ocr_status() == crate::domain::entities::OcrStatus::Pending
            })
            .cloned()
            .collect())
    }

    async fn find_by_manual(&self, manual_id: &str) -> Result<Vec<Figure>, FigureRepositoryError> {
        Ok(self
            .figures
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.manual_id() == manual_id)
            .cloned()
            .collect())
    }

    async fn count_by_manual(&self, manual_id: &str) -> Result<i64, FigureRepositoryError> {
        Ok(self.find_by_manual(manual_id).await?.len() as i64)
    }

    async fn vector_search(
        &self,
        _query: &Vector,
        _manual_id: Option<&str>,
        _tenant_id: Option<&str>,
        _min_similarity: f32,
        _limit: i64,
    ) -> Result<Vec<FigureVectorHit>, FigureRepositoryError> {
        Ok(Vec::new())
    }
}

#[derive(Default)]
pub struct MockManualRepository {
    pub manuals: Mutex<HashMap<String, Manual>>,
}

#[async_trait]
impl ManualRepository for MockManualRepository {
    async fn upsert(&self, manual: &Manual) -> Result<(), ManualRepositoryError> {
        self.manuals
            .lock()
            .unwrap()
            .insert(manual.manual_id().to_string(), manual.clone());
        Ok(())
    }

    async fn find_by_manual_id(
        &self,
        manual_id: &str,
    ) -> Result<Option<Manual>, ManualRepositoryError> {
        Ok(self.manuals.lock().unwrap().get(manual_id).cloned())
    }

    async fn update_page_count(
        &self,
        manual_id: &str,
        page_count: i32,
    ) -> Result<(), ManualRepositoryError> {
        let mut guard = self.manuals.lock().unwrap();
        let manual = guard
            .get_mut(manual_id)
            .ok_or_else(|| ManualRepositoryError::NotFound(manual_id.to_string()))?;
        manual.set_page_count(page_count);
        Ok(())
    }
}

#[derive(Default)]
pub struct MockProgressRepository {
    pub snapshots: Mutex<HashMap<String, IngestionProgress>>,
}

impl MockProgressRepository {
    pub fn get(&self, manual_id: &str) -> Option<IngestionProgress> {
        self.snapshots.lock().unwrap().get(manual_id).cloned()
    }
}

#[async_trait]
impl ProgressRepository for MockProgressRepository {
    async fn upsert(&self, progress: &IngestionProgress) -> Result<(), ProgressRepositoryError> {
        self.snapshots
            .lock()
            .unwrap()
            .insert(progress.manual_id().to_string(), progress.clone());
        Ok(())
    }

    async fn find_by_manual(
        &self,
        manual_id: &str,
    ) -> Result<Option<IngestionProgress>, ProgressRepositoryError> {
        Ok(self.snapshots.lock().unwrap().get(manual_id).cloned())
    }
}

#[derive(Default)]
pub struct MockQueryLogRepository {
    pub logs: Mutex<Vec<QueryLog>>,
}

#[async_trait]
impl QueryLogRepository for MockQueryLogRepository {
    async fn insert(&self, log: &QueryLog) -> Result<(), QueryLogRepositoryError> {
        self.logs.lock().unwrap().push(log.clone());
        Ok(())
    }
}

pub struct MockEmbeddingProvider {
    pub dimension: usize,
    pub fail_when_contains: Option<String>,
    pub calls: AtomicUsize,
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            dimension: 4,
            fail_when_contains: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing_on(substring: &str) -> Self {
        Self {
            dimension: 4,
            fail_when_contains: Some(substring.to_string()),
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn generate_embedding(
        &self,
        text: &str,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(marker) = &self.fail_when_contains {
            if text.contains(marker.as_str()) {
                return Err(EmbeddingProviderError::ApiError(
                    "simulated embedding failure".to_string(),
                ));
            }
        }
        Ok(EmbeddingResponse {
            embedding: Vector::from(vec![0.1; self.dimension]),
            model_name: "mock-embedder".to_string(),
            token_count: Some((text.len() / 4) as i32),
        })
    }

    fn model_info(&self) -> (String, Option<String>) {
        ("mock-embedder".to_string(), None)
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }
}

pub struct MockGenerationProvider {
    pub response: String,
    pub fail: bool,
    pub prompts: Mutex<Vec<GenerationRequest>>,
}

impl MockGenerationProvider {
    pub fn answering(response: &str) -> Self {
        Self {
            response: response.to_string(),
            fail: false,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            response: String::new(),
            fail: true,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationProviderError> {
        self.prompts.lock().unwrap().push(request);
        if self.fail {
            return Err(GenerationProviderError::ApiError(
                "simulated generation failure".to_string(),
            ));
        }
        Ok(GenerationResponse {
            text: self.response.clone(),
            model_name: "mock-generator".to_string(),
        })
    }

    fn model_info(&self) -> String {
        "mock-generator".to_string()
    }
}

pub struct MockVisionProvider {
    pub fail_when_url_contains: Option<String>,
    pub extraction: VisionExtraction,
}

impl MockVisionProvider {
    pub fn extracting(text: &str, quality: ImageQuality) -> Self {
        Self {
            fail_when_url_contains: None,
            extraction: VisionExtraction {
                extracted_text: Some(text.to_string()),
                text_confidence: TextConfidence::High,
                caption: Some("Figure caption".to_string()),
                figure_type: "diagram".to_string(),
                detected_components: vec!["connector".to_string()],
                semantic_tags: vec!["electrical".to_string()],
                entities: serde_json::json!({}),
                technical_complexity: "medium".to_string(),
                image_quality: quality,
            },
        }
    }

    pub fn failing_on(substring: &str, text: &str, quality: ImageQuality) -> Self {
        let mut provider = Self::extracting(text, quality);
        provider.fail_when_url_contains = Some(substring.to_string());
        provider
    }
}

#[async_trait]
impl VisionProvider for MockVisionProvider {
    async fn analyze_figure(
        &self,
        image_url: &str,
    ) -> Result<VisionExtraction, VisionProviderError> {
        if let Some(marker) = &self.fail_when_url_contains {
            if image_url.contains(marker.as_str()) {
                return Err(VisionProviderError::ApiError(
                    "simulated vision failure".to_string(),
                ));
            }
        }
        Ok(self.extraction.clone())
    }
}

pub struct StubSearchEngine {
    pub results: Mutex<Vec<RetrievalResult>>,
    pub fail: bool,
}

impl StubSearchEngine {
    pub fn returning(results: Vec<RetrievalResult>) -> Self {
        Self {
            results: Mutex::new(results),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            results: Mutex::new(Vec::new()),
            fail: true,
        }
    }
}

#[async_trait]
impl SearchEngine for StubSearchEngine {
    async fn search(
        &self,
        _query: SearchQuery,
    ) -> Result<Vec<RetrievalResult>, SearchServiceError> {
        if self.fail {
            return Err(SearchServiceError::RepositoryError(
                "simulated search outage".to_string(),
            ));
        }
        Ok(self.results.lock().unwrap().clone())
    }
}

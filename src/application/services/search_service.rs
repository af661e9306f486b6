use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::application::ports::embedding_provider::{
    EmbeddingProvider, truncate_for_embedding,
};
use crate::domain::entities::{RetrievalResult, RetrievalSource};
use crate::domain::repositories::{ChunkRepository, FigureRepository};

#[derive(Debug)]
pub enum SearchServiceError {
    EmbeddingError(String),
    RepositoryError(String),
    ValidationError(String),
}

impl std::fmt::Display for SearchServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SearchServiceError::EmbeddingError(msg) => write!(f, "Embedding error: {}", msg),
            SearchServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            SearchServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
        }
    }
}

impl std::error::Error for SearchServiceError {}

/// Recall/precision knobs. Runtime configuration because different manuals
/// and tenants need different tradeoffs.
#[derive(Debug, Clone, Copy)]
pub struct SearchConfig {
    pub vector_threshold: f32,
    pub lexical_threshold: f32,
    pub default_top_k: usize,
    /// Rerank only kicks in above this many merged candidates.
    pub rerank_min_candidates: usize,
    /// How many raw candidates to pull from each arm before merging.
    pub candidate_limit: i64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            vector_threshold: 0.35,
            lexical_threshold: 0.25,
            default_top_k: 8,
            rerank_min_candidates: 5,
            candidate_limit: 30,
        }
    }
}

impl SearchConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            vector_threshold: env_f32("SEARCH_VECTOR_THRESHOLD", defaults.vector_threshold),
            lexical_threshold: env_f32("SEARCH_LEXICAL_THRESHOLD", defaults.lexical_threshold),
            default_top_k: env_usize("SEARCH_TOP_K", defaults.default_top_k),
            rerank_min_candidates: env_usize(
                "SEARCH_RERANK_MIN_CANDIDATES",
                defaults.rerank_min_candidates,
            ),
            candidate_limit: env_i64("SEARCH_CANDIDATE_LIMIT", defaults.candidate_limit),
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

fn env_i64(key: &str, default: i64) -> i64 {
    std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

#[derive(Debug, Clone)]
pub struct SearchQuery {
    pub query: String,
    pub manual_id: Option<String>,
    pub tenant_id: Option<String>,
    pub top_k: Option<usize>,
}

/// Seam between retrieval and its consumers (orchestrator, quality probes).
#[async_trait]
pub trait SearchEngine: Send + Sync {
    async fn search(
        &self,
        query: SearchQuery,
    ) -> Result<Vec<RetrievalResult>, SearchServiceError>;
}

pub struct SearchService {
    chunk_repository: Arc<dyn ChunkRepository>,
    figure_repository: Arc<dyn FigureRepository>,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    config: SearchConfig,
}

impl SearchService {
    pub fn new(
        chunk_repository: Arc<dyn ChunkRepository>,
        figure_repository: Arc<dyn FigureRepository>,
        embedding_provider: Arc<dyn EmbeddingProvider>,
        config: SearchConfig,
    ) -> Self {
        Self {
            chunk_repository,
            figure_repository,
            embedding_provider,
            config,
        }
    }
}

#[async_trait]
impl SearchEngine for SearchService {
    async fn search(
        &self,
        request: SearchQuery,
    ) -> Result<Vec<RetrievalResult>, SearchServiceError> {
        if request.query.trim().is_empty() {
            return Err(SearchServiceError::ValidationError(
                "Query cannot be empty".to_string(),
            ));
        }

        let top_k = request.top_k.unwrap_or(self.config.default_top_k).max(1);
        let manual_id = request.manual_id.as_deref();
        let tenant_id = request.tenant_id.as_deref();

        let query_text = truncate_for_embedding(&request.query);
        let embedding = self
            .embedding_provider
            .generate_embedding(&query_text)
            .await
            .map_err(|e| SearchServiceError::EmbeddingError(e.to_string()))?;

        // Vector arm: chunks and figures above the similarity floor.
        let chunk_hits = self
            .chunk_repository
            .vector_search(
                &embedding.embedding,
                manual_id,
                tenant_id,
                self.config.vector_threshold,
                self.config.candidate_limit,
            )
            .await
            .map_err(|e| SearchServiceError::RepositoryError(e.to_string()))?;

        let figure_hits = self
            .figure_repository
            .vector_search(
                &embedding.embedding,
                manual_id,
                tenant_id,
                self.config.vector_threshold,
                self.config.candidate_limit,
            )
            .await
            .map_err(|e| SearchServiceError::RepositoryError(e.to_string()))?;

        let mut candidates: Vec<RetrievalResult> = Vec::new();
        for hit in chunk_hits {
            candidates.push(RetrievalResult {
                id: hit.chunk.id(),
                manual_id: hit.chunk.manual_id().to_string(),
                content: hit.chunk.content().to_string(),
                page_start: hit.chunk.page_start(),
                page_end: hit.chunk.page_end(),
                menu_path: hit.chunk.menu_path().map(|s| s.to_string()),
                vector_score: hit.similarity,
                rerank_score: None,
                source: RetrievalSource::Chunk,
            });
        }
        for hit in figure_hits {
            candidates.push(RetrievalResult {
                id: hit.figure.id(),
                manual_id: hit.figure.manual_id().to_string(),
                content: hit
                    .figure
                    .embedding_text()
                    .unwrap_or_default()
                    .to_string(),
                page_start: hit.figure.page_number(),
                page_end: hit.figure.page_number(),
                menu_path: None,
                vector_score: hit.similarity,
                rerank_score: None,
                source: RetrievalSource::Figure,
            });
        }

        // Lexical arm: substring term matches, scored by matched-term ratio.
        let terms = query_terms(&request.query);
        if !terms.is_empty() {
            let lexical_chunks = self
                .chunk_repository
                .lexical_search(&terms, manual_id, tenant_id, self.config.candidate_limit)
                .await
                .map_err(|e| SearchServiceError::RepositoryError(e.to_string()))?;

            for chunk in lexical_chunks {
                let score = lexical_score(&terms, chunk.content());
                if score < self.config.lexical_threshold {
                    continue;
                }
                candidates.push(RetrievalResult {
                    id: chunk.id(),
                    manual_id: chunk.manual_id().to_string(),
                    content: chunk.content().to_string(),
                    page_start: chunk.page_start(),
                    page_end: chunk.page_end(),
                    menu_path: chunk.menu_path().map(|s| s.to_string()),
                    vector_score: score,
                    rerank_score: None,
                    source: RetrievalSource::Chunk,
                });
            }
        }

        let mut merged = merge_candidates(candidates);

        if merged.len() > self.config.rerank_min_candidates {
            rerank(&terms, &mut merged);
        }

        merged.sort_by(|a, b| {
            b.effective_score()
                .partial_cmp(&a.effective_score())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        merged.truncate(top_k);

        Ok(merged)
    }
}

/// Lowercased query terms of 3+ characters, deduplicated, order preserved.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    query
        .split(|c: char| !c.is_alphanumeric())
        .map(|t| t.to_lowercase())
        .filter(|t| t.chars().count() >= 3)
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

/// Fraction of query terms present in the content, case-insensitive.
pub fn lexical_score(terms: &[String], content: &str) -> f32 {
    if terms.is_empty() {
        return 0.0;
    }
    let haystack = content.to_lowercase();
    let matched = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
    matched as f32 / terms.len() as f32
}

/// Dedup by row identity, keeping the highest-scoring copy of each hit.
pub fn merge_candidates(candidates: Vec<RetrievalResult>) -> Vec<RetrievalResult> {
    let mut best: HashMap<uuid::Uuid, RetrievalResult> = HashMap::new();
    for candidate in candidates {
        match best.get(&candidate.id) {
            Some(existing) if existing.vector_score >= candidate.vector_score => {}
            _ => {
                best.insert(candidate.id, candidate);
            }
        }
    }
    best.into_values().collect()
}

/// Deterministic rerank: blend the vector score with query-term overlap.
/// Cheap second pass that pulls up results actually mentioning what was
/// asked about.
pub fn rerank(terms: &[String], candidates: &mut [RetrievalResult]) {
    for candidate in candidates.iter_mut() {
        let overlap = lexical_score(terms, &candidate.content);
        candidate.rerank_score = Some(0.6 * candidate.vector_score + 0.4 * overlap);
    }
}

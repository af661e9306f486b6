use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, warn};

use crate::application::ports::generation_provider::{GenerationProvider, GenerationRequest};
use crate::application::services::search_service::{SearchEngine, SearchQuery};
use crate::domain::entities::{Figure, ManualChunk};
use crate::domain::repositories::{ChunkRepository, FigureRepository};

/// Chunks shorter than this read as fragments.
const SHORT_CHUNK_CHARS: usize = 100;
/// Chunks longer than this dilute retrieval.
const LONG_CHUNK_CHARS: usize = 2000;
/// Prefix length used for near-duplicate detection.
const UNIQUENESS_PREFIX_CHARS: usize = 200;
/// A figure counts as enhanced once its caption carries real content.
const ENHANCED_CAPTION_CHARS: usize = 50;

/// Issue thresholds: a few stubs are tolerable, a third of the manual isn't.
const SHORT_RATIO_ISSUE: f32 = 0.3;
const COVERAGE_ISSUE_FLOOR: f32 = 0.95;
const AVG_LENGTH_ISSUE_FLOOR: f32 = 200.0;

const QUESTIONS_TO_GENERATE: usize = 10;
const QUESTIONS_TO_PROBE: usize = 5;

#[derive(Debug)]
pub enum QualityServiceError {
    ValidationError(String),
    RepositoryError(String),
    GenerationError(String),
}

impl std::fmt::Display for QualityServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QualityServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            QualityServiceError::RepositoryError(msg) => write!(f, "Repository error: {}", msg),
            QualityServiceError::GenerationError(msg) => write!(f, "Generation error: {}", msg),
        }
    }
}

impl std::error::Error for QualityServiceError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTestType {
    Metrics,
    Questions,
    /// Retrieval-path check: runs the golden-question probes through the
    /// search engine, skipping static metrics.
    Search,
    All,
}

impl QualityTestType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTestType::Metrics => "metrics",
            QualityTestType::Questions => "questions",
            QualityTestType::Search => "search",
            QualityTestType::All => "all",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "metrics" => Ok(QualityTestType::Metrics),
            "questions" => Ok(QualityTestType::Questions),
            "search" => Ok(QualityTestType::Search),
            "all" => Ok(QualityTestType::All),
            _ => Err(format!("Invalid quality test type: {}", s)),
        }
    }

    fn runs_metrics(&self) -> bool {
        matches!(self, QualityTestType::Metrics | QualityTestType::All)
    }

    fn runs_questions(&self) -> bool {
        matches!(
            self,
            QualityTestType::Questions | QualityTestType::Search | QualityTestType::All
        )
    }
}

/// Static index health metrics, computed from stored rows without touching
/// any oracle.
#[derive(Debug, Clone, Serialize)]
pub struct ChunkMetrics {
    pub total_chunks: usize,
    pub avg_length: f32,
    pub short_chunks: usize,
    pub long_chunks: usize,
    pub uniqueness: f32,
    pub embedding_coverage: f32,
    pub total_figures: usize,
    pub figure_enhancement: f32,
    pub overall_score: f32,
    pub issues: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Passed,
    Failed,
    /// The probe itself broke (search outage); distinct from a question the
    /// index genuinely cannot answer.
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct QuestionProbe {
    pub question: String,
    pub status: ProbeStatus,
    pub result_count: usize,
    /// Best similarity among the returned results; None when nothing came
    /// back or the probe errored.
    pub top_score: Option<f32>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub generated: usize,
    pub probed: usize,
    pub passed: usize,
    pub failed: usize,
    pub errors: usize,
    pub probes: Vec<QuestionProbe>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualityReport {
    pub manual_id: String,
    pub test_type: QualityTestType,
    pub metrics: Option<ChunkMetrics>,
    pub probe_report: Option<ProbeReport>,
    pub recommendations: Vec<String>,
}

/// Evaluates how well a manual's index will serve real questions, with
/// static metrics and generated golden-question probes.
pub struct QualityService {
    chunk_repository: Arc<dyn ChunkRepository>,
    figure_repository: Arc<dyn FigureRepository>,
    search_engine: Arc<dyn SearchEngine>,
    generation_provider: Arc<dyn GenerationProvider>,
}

impl QualityService {
    pub fn new(
        chunk_repository: Arc<dyn ChunkRepository>,
        figure_repository: Arc<dyn FigureRepository>,
        search_engine: Arc<dyn SearchEngine>,
        generation_provider: Arc<dyn GenerationProvider>,
    ) -> Self {
        Self {
            chunk_repository,
            figure_repository,
            search_engine,
            generation_provider,
        }
    }

    pub async fn evaluate(
        &self,
        manual_id: &str,
        tenant_id: &str,
        test_type: QualityTestType,
    ) -> Result<QualityReport, QualityServiceError> {
        let chunks = self
            .chunk_repository
            .find_by_manual(manual_id)
            .await
            .map_err(|e| QualityServiceError::RepositoryError(e.to_string()))?;
        if chunks.is_empty() {
            return Err(QualityServiceError::ValidationError(format!(
                "Manual {} has no indexed chunks",
                manual_id
            )));
        }

        let mut metrics = None;
        if test_type.runs_metrics() {
            let figures = self
                .figure_repository
                .find_by_manual(manual_id)
                .await
                .map_err(|e| QualityServiceError::RepositoryError(e.to_string()))?;
            metrics = Some(compute_metrics(&chunks, &figures));
        }

        let mut probe_report = None;
        if test_type.runs_questions() {
            probe_report = Some(self.probe_questions(manual_id, tenant_id, &chunks).await?);
        }

        let recommendations = recommend(metrics.as_ref(), probe_report.as_ref());

        info!(
            manual_id = %manual_id,
            test_type = ?test_type,
            overall = metrics.as_ref().map(|m| m.overall_score),
            "Quality evaluation finished"
        );

        Ok(QualityReport {
            manual_id: manual_id.to_string(),
            test_type,
            metrics,
            probe_report,
            recommendations,
        })
    }

    /// Generate golden questions from sampled chunk content, then run a
    /// subset through search. A question passes when at least one result
    /// comes back.
    async fn probe_questions(
        &self,
        manual_id: &str,
        tenant_id: &str,
        chunks: &[ManualChunk],
    ) -> Result<ProbeReport, QualityServiceError> {
        let questions = self.generate_questions(chunks).await?;
        let generated = questions.len();

        let mut probes = Vec::new();
        for question in questions.into_iter().take(QUESTIONS_TO_PROBE) {
            let probe = match self
                .search_engine
                .search(SearchQuery {
                    query: question.clone(),
                    manual_id: Some(manual_id.to_string()),
                    tenant_id: Some(tenant_id.to_string()),
                    top_k: Some(3),
                })
                .await
            {
                Ok(results) => QuestionProbe {
                    question,
                    status: if results.is_empty() {
                        ProbeStatus::Failed
                    } else {
                        ProbeStatus::Passed
                    },
                    result_count: results.len(),
                    top_score: results
                        .iter()
                        .map(|r| r.effective_score())
                        .fold(None, |best: Option<f32>, s| {
                            Some(best.map_or(s, |b| b.max(s)))
                        }),
                },
                Err(e) => {
                    warn!(error = %e, "Golden question probe errored");
                    QuestionProbe {
                        question,
                        status: ProbeStatus::Error,
                        result_count: 0,
                        top_score: None,
                    }
                }
            };
            probes.push(probe);
        }

        let passed = probes.iter().filter(|p| p.status == ProbeStatus::Passed).count();
        let failed = probes.iter().filter(|p| p.status == ProbeStatus::Failed).count();
        let errors = probes.iter().filter(|p| p.status == ProbeStatus::Error).count();

        Ok(ProbeReport {
            generated,
            probed: probes.len(),
            passed,
            failed,
            errors,
            probes,
        })
    }

    async fn generate_questions(
        &self,
        chunks: &[ManualChunk],
    ) -> Result<Vec<String>, QualityServiceError> {
        let mut samples = String::new();
        for chunk in chunks.iter().take(5) {
            let excerpt: String = chunk.content().chars().take(300).collect();
            samples.push_str(&excerpt);
            samples.push_str("\n---\n");
        }

        let request = GenerationRequest {
            system_prompt: "You write realistic troubleshooting questions a technician \
                            would ask about an appliance manual. Output one question per \
                            line, nothing else."
                .to_string(),
            user_prompt: format!(
                "Based on these manual excerpts, write {} questions:\n\n{}",
                QUESTIONS_TO_GENERATE, samples
            ),
        };

        let response = self
            .generation_provider
            .generate(request)
            .await
            .map_err(|e| QualityServiceError::GenerationError(e.to_string()))?;

        Ok(parse_questions(&response.text))
    }
}

/// Extract one question per line, tolerating numbering and bullets.
pub fn parse_questions(text: &str) -> Vec<String> {
    text.lines()
        .map(|line| {
            line.trim()
                .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == ')' || c == '-' || c == '*')
                .trim()
                .to_string()
        })
        .filter(|line| line.chars().count() > 10)
        .take(QUESTIONS_TO_GENERATE)
        .collect()
}

/// Pure metric computation over stored chunk and figure rows.
pub fn compute_metrics(chunks: &[ManualChunk], figures: &[Figure]) -> ChunkMetrics {
    let total = chunks.len();
    let total_chars: usize = chunks.iter().map(|c| c.character_count()).sum();
    let avg_length = total_chars as f32 / total as f32;
    let short = chunks
        .iter()
        .filter(|c| c.character_count() < SHORT_CHUNK_CHARS)
        .count();
    let long = chunks
        .iter()
        .filter(|c| c.character_count() > LONG_CHUNK_CHARS)
        .count();

    let prefixes: HashSet<String> = chunks
        .iter()
        .map(|c| c.content().chars().take(UNIQUENESS_PREFIX_CHARS).collect())
        .collect();
    let uniqueness = prefixes.len() as f32 / total as f32;

    let embedded = chunks.iter().filter(|c| c.has_embedding()).count();
    let embedding_coverage = embedded as f32 / total as f32;

    let figure_enhancement = if figures.is_empty() {
        // No figures to enhance is not a defect.
        1.0
    } else {
        let enhanced = figures
            .iter()
            .filter(|f| {
                f.caption_text()
                    .map(|c| c.chars().count() >= ENHANCED_CAPTION_CHARS)
                    .unwrap_or(false)
            })
            .count();
        enhanced as f32 / figures.len() as f32
    };

    // Each short chunk costs 5 points and each long one 2, off a 100-point
    // base.
    let length_score = (100.0 - 5.0 * short as f32 - 2.0 * long as f32).clamp(0.0, 100.0);

    let overall_score =
        (length_score + figure_enhancement * 100.0 + embedding_coverage * 100.0) / 3.0;

    let mut issues = Vec::new();
    if short as f32 / total as f32 > SHORT_RATIO_ISSUE {
        issues.push(format!(
            "{} of {} chunks are under {} characters",
            short, total, SHORT_CHUNK_CHARS
        ));
    }
    if long > 0 {
        issues.push(format!(
            "{} of {} chunks exceed {} characters",
            long, total, LONG_CHUNK_CHARS
        ));
    }
    if avg_length < AVG_LENGTH_ISSUE_FLOOR {
        issues.push(format!(
            "Average chunk length is {:.0} characters; expected at least {:.0}",
            avg_length, AVG_LENGTH_ISSUE_FLOOR
        ));
    }
    if uniqueness < 0.8 {
        issues.push(format!(
            "Only {:.0}% of chunks have distinct leading content",
            uniqueness * 100.0
        ));
    }
    if embedding_coverage < COVERAGE_ISSUE_FLOOR {
        issues.push(format!(
            "{:.0}% of chunks are missing embeddings",
            (1.0 - embedding_coverage) * 100.0
        ));
    }
    if figure_enhancement < 0.5 && !figures.is_empty() {
        issues.push("Most figures lack useful captions".to_string());
    }

    ChunkMetrics {
        total_chunks: total,
        avg_length,
        short_chunks: short,
        long_chunks: long,
        uniqueness,
        embedding_coverage,
        total_figures: figures.len(),
        figure_enhancement,
        overall_score,
        issues,
    }
}

fn recommend(metrics: Option<&ChunkMetrics>, probes: Option<&ProbeReport>) -> Vec<String> {
    let mut recommendations = Vec::new();

    if let Some(m) = metrics {
        if m.overall_score >= 85.0 {
            recommendations.push("Index quality is good; no action needed.".to_string());
        } else if m.overall_score >= 70.0 {
            recommendations
                .push("Index quality is acceptable; review the flagged issues.".to_string());
        } else {
            recommendations.push(
                "Index quality is poor; re-ingestion with adjusted chunking is recommended."
                    .to_string(),
            );
        }
    }

    if let Some(p) = probes {
        if p.failed > 0 {
            recommendations.push(format!(
                "{} of {} probe questions returned no results; coverage gaps likely.",
                p.failed, p.probed
            ));
        }
        if p.errors > 0 {
            recommendations.push(
                "Some probes errored; re-run the evaluation once search is healthy.".to_string(),
            );
        }
    }

    recommendations
}

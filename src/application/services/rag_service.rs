use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::application::ports::generation_provider::{GenerationProvider, GenerationRequest};
use crate::application::services::answer_style::{
    AnswerMode, RetrievalSignals, StyleDecision, select_mode,
};
use crate::application::services::search_service::{SearchEngine, SearchQuery};
use crate::domain::entities::{QueryLog, RetrievalResult, RetrievalSource};
use crate::domain::repositories::QueryLogRepository;

/// Hard ceiling for SMS replies, carrier-enforced.
pub const SMS_CHAR_LIMIT: usize = 280;
const SMS_ELLIPSIS: &str = "...";

#[derive(Debug)]
pub enum RagServiceError {
    ValidationError(String),
    GenerationError(String),
}

impl std::fmt::Display for RagServiceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RagServiceError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            RagServiceError::GenerationError(msg) => write!(f, "Generation error: {}", msg),
        }
    }
}

impl std::error::Error for RagServiceError {}

#[derive(Debug, Clone, Copy)]
pub struct RagConfig {
    /// How many retrieved passages make it into the prompt.
    pub context_limit: usize,
    /// Per-passage character cap inside the prompt.
    pub snippet_chars: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            context_limit: 6,
            snippet_chars: 1200,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnswerRequest {
    pub question: String,
    pub manual_id: Option<String>,
    pub tenant_id: String,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Citation {
    pub source: RetrievalSource,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub score: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerDebug {
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub result_count: usize,
    pub retrieval_method: String,
    pub signals: RetrievalSignals,
    pub is_weak: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerResponse {
    pub answer: String,
    pub mode: AnswerMode,
    pub citations: Vec<Citation>,
    pub debug: AnswerDebug,
}

/// Question-to-answer orchestrator: retrieve, pick a style, generate, cite,
/// and log. Retrieval failures degrade to an uncited cautious answer;
/// generation failures are surfaced because there is nothing to degrade to.
pub struct RagService {
    search_engine: Arc<dyn SearchEngine>,
    generation_provider: Arc<dyn GenerationProvider>,
    query_log_repository: Arc<dyn QueryLogRepository>,
    config: RagConfig,
}

impl RagService {
    pub fn new(
        search_engine: Arc<dyn SearchEngine>,
        generation_provider: Arc<dyn GenerationProvider>,
        query_log_repository: Arc<dyn QueryLogRepository>,
        config: RagConfig,
    ) -> Self {
        Self {
            search_engine,
            generation_provider,
            query_log_repository,
            config,
        }
    }

    pub async fn answer(
        &self,
        request: AnswerRequest,
    ) -> Result<AnswerResponse, RagServiceError> {
        if request.question.trim().is_empty() {
            return Err(RagServiceError::ValidationError(
                "Question cannot be empty".to_string(),
            ));
        }

        let retrieval_started = Instant::now();
        let (results, retrieval_method) = match self
            .search_engine
            .search(SearchQuery {
                query: request.question.clone(),
                manual_id: request.manual_id.clone(),
                tenant_id: Some(request.tenant_id.clone()),
                top_k: request.top_k,
            })
            .await
        {
            Ok(results) => (results, "hybrid".to_string()),
            Err(e) => {
                warn!(error = %e, "Retrieval failed, degrading to uncited answer");
                (Vec::new(), "degraded".to_string())
            }
        };
        let retrieval_ms = retrieval_started.elapsed().as_millis() as u64;

        let signals = RetrievalSignals::from_results(&results);
        let decision = select_mode(signals);

        let prompt = build_prompt(&request.question, &results, decision, &self.config);
        let generation_started = Instant::now();
        let generation = self
            .generation_provider
            .generate(prompt)
            .await
            .map_err(|e| RagServiceError::GenerationError(e.to_string()))?;
        let generation_ms = generation_started.elapsed().as_millis() as u64;

        let citations: Vec<Citation> = results
            .iter()
            .take(self.config.context_limit)
            .map(|r| Citation {
                source: r.source,
                page_start: r.page_start,
                page_end: r.page_end,
                menu_path: r.menu_path.clone(),
                score: r.effective_score(),
            })
            .collect();

        self.log_query(&request, &generation.text, &generation.model_name, signals, decision, &retrieval_method);

        info!(
            tenant_id = %request.tenant_id,
            mode = decision.mode.as_str(),
            results = results.len(),
            retrieval_ms,
            generation_ms,
            "Answered question"
        );

        Ok(AnswerResponse {
            answer: generation.text,
            mode: decision.mode,
            citations,
            debug: AnswerDebug {
                retrieval_ms,
                generation_ms,
                result_count: results.len(),
                retrieval_method,
                signals,
                is_weak: decision.is_weak,
            },
        })
    }

    /// Answer formatted for an SMS reply: plain text, hard length cap.
    pub async fn answer_for_sms(
        &self,
        request: AnswerRequest,
    ) -> Result<String, RagServiceError> {
        let response = self.answer(request).await?;
        Ok(truncate_sms(&response.answer))
    }

    /// Fire-and-forget append to the query log; losing a log row must never
    /// fail an answer.
    fn log_query(
        &self,
        request: &AnswerRequest,
        answer: &str,
        model_name: &str,
        signals: RetrievalSignals,
        decision: StyleDecision,
        retrieval_method: &str,
    ) {
        let log = QueryLog::new(
            request.question.clone(),
            answer.to_string(),
            request.manual_id.clone(),
            request.tenant_id.clone(),
            signals.avg_top3.clamp(0.0, 1.0),
            None,
            None,
            retrieval_method.to_string(),
            decision.mode.as_str().to_string(),
            model_name.to_string(),
        );
        let repository = self.query_log_repository.clone();
        tokio::spawn(async move {
            if let Err(e) = repository.insert(&log).await {
                warn!(error = %e, "Could not write query log");
            }
        });
    }
}

fn build_prompt(
    question: &str,
    results: &[RetrievalResult],
    decision: StyleDecision,
    config: &RagConfig,
) -> GenerationRequest {
    let mut system_prompt = String::from(
        "You are a technician's assistant answering from appliance service \
         manual excerpts. Only state what the excerpts support. ",
    );
    system_prompt.push_str(decision.mode.directive());

    let mut user_prompt = String::new();
    if results.is_empty() {
        user_prompt.push_str("No manual excerpts were found for this question.\n\n");
    } else {
        user_prompt.push_str("Manual excerpts:\n");
        for (i, result) in results.iter().take(config.context_limit).enumerate() {
            let snippet: String = result.content.chars().take(config.snippet_chars).collect();
            user_prompt.push_str(&format!(
                "[{}] (pages {}-{}) {}\n",
                i + 1,
                result.page_start,
                result.page_end,
                snippet
            ));
        }
        user_prompt.push('\n');
    }
    user_prompt.push_str("Question: ");
    user_prompt.push_str(question);

    GenerationRequest {
        system_prompt,
        user_prompt,
    }
}

/// Cap a reply at the SMS limit: 277 characters of answer plus "...".
pub fn truncate_sms(text: &str) -> String {
    if text.chars().count() <= SMS_CHAR_LIMIT {
        return text.to_string();
    }
    let prefix: String = text
        .chars()
        .take(SMS_CHAR_LIMIT - SMS_ELLIPSIS.len())
        .collect();
    format!("{}{}", prefix, SMS_ELLIPSIS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::services::test_support::{
        MockGenerationProvider, MockQueryLogRepository, StubSearchEngine,
    };
    use std::time::Duration;
    use uuid::Uuid;

    fn result(content: &str, score: f32) -> RetrievalResult {
        RetrievalResult {
            id: Uuid::new_v4(),
            manual_id: "m-1".to_string(),
            content: content.to_string(),
            page_start: 12,
            page_end: 13,
            menu_path: Some("Troubleshooting > Ice Maker".to_string()),
            vector_score: score,
            rerank_score: None,
            source: RetrievalSource::Chunk,
        }
    }

    fn request(question: &str) -> AnswerRequest {
        AnswerRequest {
            question: question.to_string(),
            manual_id: Some("m-1".to_string()),
            tenant_id: "t-1".to_string(),
            top_k: None,
        }
    }

    fn service(
        search: StubSearchEngine,
        generation: MockGenerationProvider,
        logs: Arc<MockQueryLogRepository>,
    ) -> (RagService, Arc<MockGenerationProvider>) {
        let generation = Arc::new(generation);
        let svc = RagService::new(
            Arc::new(search),
            generation.clone(),
            logs,
            RagConfig::default(),
        );
        (svc, generation)
    }

    #[tokio::test]
    async fn test_strong_retrieval_cites_and_uses_standard_mode() {
        let logs = Arc::new(MockQueryLogRepository::default());
        let (svc, generation) = service(
            StubSearchEngine::returning(vec![
                result("Check the water inlet valve for 120V during fill.", 0.9),
                result("The fill tube heater prevents ice blockage.", 0.8),
            ]),
            MockGenerationProvider::answering("Check the inlet valve for 120V during fill."),
            logs.clone(),
        );

        let response = svc.answer(request("ice maker not filling")).await.unwrap();
        assert_eq!(response.mode, AnswerMode::Standard);
        assert_eq!(response.citations.len(), 2);
        assert_eq!(response.citations[0].page_start, 12);
        assert!(!response.debug.is_weak);
        assert_eq!(response.debug.retrieval_method, "hybrid");

        // The prompt carried the retrieved passages.
        let prompts = generation.prompts.lock().unwrap();
        assert!(prompts[0].user_prompt.contains("water inlet valve"));
        assert!(prompts[0].user_prompt.contains("pages 12-13"));

        drop(prompts);
        tokio::time::sleep(Duration::from_millis(20)).await;
        let logged = logs.logs.lock().unwrap();
        assert_eq!(logged.len(), 1);
        assert_eq!(logged[0].adaptive_mode(), "standard");
    }

    #[tokio::test]
    async fn test_empty_retrieval_yields_cautious_uncited_answer() {
        let logs = Arc::new(MockQueryLogRepository::default());
        let (svc, generation) = service(
            StubSearchEngine::returning(Vec::new()),
            MockGenerationProvider::answering("The manual does not cover this."),
            logs,
        );

        let response = svc.answer(request("how do I paint the fridge")).await.unwrap();
        assert!(response.citations.is_empty());
        assert_eq!(response.mode, AnswerMode::Cautious);
        assert!(response.debug.is_weak);
        assert_eq!(response.debug.result_count, 0);

        let prompts = generation.prompts.lock().unwrap();
        assert!(prompts[0].user_prompt.contains("No manual excerpts"));
    }

    #[tokio::test]
    async fn test_search_outage_degrades_instead_of_failing() {
        let logs = Arc::new(MockQueryLogRepository::default());
        let (svc, _) = service(
            StubSearchEngine::failing(),
            MockGenerationProvider::answering("I cannot reach the manual right now."),
            logs,
        );

        let response = svc.answer(request("compressor hums but no start")).await.unwrap();
        assert!(response.citations.is_empty());
        assert_eq!(response.mode, AnswerMode::Cautious);
        assert_eq!(response.debug.retrieval_method, "degraded");
    }

    #[tokio::test]
    async fn test_generation_failure_is_surfaced() {
        let logs = Arc::new(MockQueryLogRepository::default());
        let (svc, _) = service(
            StubSearchEngine::returning(vec![result("Relay test procedure.", 0.85)]),
            MockGenerationProvider::failing(),
            logs,
        );

        let result = svc.answer(request("how to test the start relay")).await;
        assert!(matches!(result, Err(RagServiceError::GenerationError(_))));
    }

    #[tokio::test]
    async fn test_empty_question_is_rejected() {
        let logs = Arc::new(MockQueryLogRepository::default());
        let (svc, _) = service(
            StubSearchEngine::returning(Vec::new()),
            MockGenerationProvider::answering("unused"),
            logs,
        );
        assert!(matches!(
            svc.answer(request("   ")).await,
            Err(RagServiceError::ValidationError(_))
        ));
    }

    #[test]
    fn test_sms_truncation_is_exact() {
        let short = "Replace the 5A fuse.";
        assert_eq!(truncate_sms(short), short);

        let exactly_limit = "x".repeat(SMS_CHAR_LIMIT);
        assert_eq!(truncate_sms(&exactly_limit), exactly_limit);

        let long = "y".repeat(400);
        let truncated = truncate_sms(&long);
        assert_eq!(truncated.chars().count(), SMS_CHAR_LIMIT);
        assert!(truncated.ends_with("..."));
        assert_eq!(&truncated[..277], &long[..277]);
    }
}

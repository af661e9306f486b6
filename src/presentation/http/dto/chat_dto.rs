use serde::{Deserialize, Serialize};

use crate::application::services::rag_service::{AnswerRequest, AnswerResponse};

#[derive(Debug, Deserialize)]
pub struct ChatRequestDto {
    pub question: String,
    pub manual_id: Option<String>,
    pub tenant_id: String,
    pub top_k: Option<usize>,
}

impl From<ChatRequestDto> for AnswerRequest {
    fn from(dto: ChatRequestDto) -> Self {
        AnswerRequest {
            question: dto.question,
            manual_id: dto.manual_id,
            tenant_id: dto.tenant_id,
            top_k: dto.top_k,
        }
    }
}

/// SMS replies are plain text, so the request carries no tuning knobs.
#[derive(Debug, Deserialize)]
pub struct SmsRequestDto {
    pub question: String,
    pub manual_id: Option<String>,
    pub tenant_id: String,
}

impl From<SmsRequestDto> for AnswerRequest {
    fn from(dto: SmsRequestDto) -> Self {
        AnswerRequest {
            question: dto.question,
            manual_id: dto.manual_id,
            tenant_id: dto.tenant_id,
            top_k: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CitationDto {
    pub source: String,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub score: f32,
}

#[derive(Debug, Serialize)]
pub struct ChatDebugDto {
    pub retrieval_ms: u64,
    pub generation_ms: u64,
    pub result_count: usize,
    pub retrieval_method: String,
    pub top_score: f32,
    pub avg_top3: f32,
    pub strong_hit_count: usize,
    pub is_weak: bool,
}

#[derive(Debug, Serialize)]
pub struct ChatResponseDto {
    pub answer: String,
    pub mode: String,
    pub citations: Vec<CitationDto>,
    pub debug: ChatDebugDto,
}

impl From<AnswerResponse> for ChatResponseDto {
    fn from(response: AnswerResponse) -> Self {
        Self {
            answer: response.answer,
            mode: response.mode.as_str().to_string(),
            citations: response
                .citations
                .into_iter()
                .map(|c| CitationDto {
                    source: c.source.as_str().to_string(),
                    page_start: c.page_start,
                    page_end: c.page_end,
                    menu_path: c.menu_path,
                    score: c.score,
                })
                .collect(),
            debug: ChatDebugDto {
                retrieval_ms: response.debug.retrieval_ms,
                generation_ms: response.debug.generation_ms,
                result_count: response.debug.result_count,
                retrieval_method: response.debug.retrieval_method,
                top_score: response.debug.signals.top_score,
                avg_top3: response.debug.signals.avg_top3,
                strong_hit_count: response.debug.signals.strong_hit_count,
                is_weak: response.debug.is_weak,
            },
        }
    }
}

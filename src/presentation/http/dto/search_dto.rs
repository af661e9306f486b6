use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::entities::RetrievalResult;

#[derive(Debug, Deserialize)]
pub struct SearchRequestDto {
    pub query: String,
    pub manual_id: Option<String>,
    pub tenant_id: Option<String>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultDto {
    pub id: Uuid,
    pub manual_id: String,
    pub content: String,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub score: f32,
    pub source: String,
}

impl From<RetrievalResult> for SearchResultDto {
    fn from(result: RetrievalResult) -> Self {
        Self {
            id: result.id,
            manual_id: result.manual_id.clone(),
            page_start: result.page_start,
            page_end: result.page_end,
            menu_path: result.menu_path.clone(),
            score: result.effective_score(),
            source: result.source.as_str().to_string(),
            content: result.content,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResponseDto {
    pub results: Vec<SearchResultDto>,
    pub count: usize,
}

impl From<Vec<RetrievalResult>> for SearchResponseDto {
    fn from(results: Vec<RetrievalResult>) -> Self {
        let results: Vec<SearchResultDto> =
            results.into_iter().map(SearchResultDto::from).collect();
        Self {
            count: results.len(),
            results,
        }
    }
}

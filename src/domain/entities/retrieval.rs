use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalSource {
    Chunk,
    Figure,
}

impl RetrievalSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetrievalSource::Chunk => "chunk",
            RetrievalSource::Figure => "figure",
        }
    }
}

/// Transient search hit. Never persisted; ranked and truncated before the
/// generation step sees it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalResult {
    pub id: Uuid,
    pub manual_id: String,
    pub content: String,
    pub page_start: i32,
    pub page_end: i32,
    pub menu_path: Option<String>,
    pub vector_score: f32,
    pub rerank_score: Option<f32>,
    pub source: RetrievalSource,
}

impl RetrievalResult {
    /// Score used for final ordering: rerank when available, else vector.
    pub fn effective_score(&self) -> f32 {
        self.rerank_score.unwrap_or(self.vector_score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_score_prefers_rerank() {
        let mut result = RetrievalResult {
            id: Uuid::new_v4(),
            manual_id: "m-1".to_string(),
            content: "content".to_string(),
            page_start: 1,
            page_end: 1,
            menu_path: None,
            vector_score: 0.6,
            rerank_score: None,
            source: RetrievalSource::Chunk,
        };
        assert_eq!(result.effective_score(), 0.6);
        result.rerank_score = Some(0.9);
        assert_eq!(result.effective_score(), 0.9);
    }
}

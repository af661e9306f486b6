use async_trait::async_trait;
use pgvector::Vector;

/// Hard input ceiling for the embedding oracle, in characters. Callers
/// truncate before calling; the provider rejects anything longer.
pub const MAX_EMBED_CHARS: usize = 8000;

#[derive(Debug)]
pub enum EmbeddingProviderError {
    NetworkError(String),
    ApiError(String),
    InvalidInput(String),
    RateLimitExceeded,
    ServiceUnavailable,
}

impl std::fmt::Display for EmbeddingProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmbeddingProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            EmbeddingProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            EmbeddingProviderError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            EmbeddingProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
            EmbeddingProviderError::ServiceUnavailable => write!(f, "Service unavailable"),
        }
    }
}

impl std::error::Error for EmbeddingProviderError {}

#[derive(Debug, Clone)]
pub struct EmbeddingResponse {
    pub embedding: Vector,
    pub model_name: String,
    pub token_count: Option<i32>,
}

/// Truncate text to the embedding oracle's input ceiling.
pub fn truncate_for_embedding(text: &str) -> String {
    text.chars().take(MAX_EMBED_CHARS).collect()
}

#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn generate_embedding(
        &self,
        text: &str,
    ) -> Result<EmbeddingResponse, EmbeddingProviderError>;

    fn model_info(&self) -> (String, Option<String>);

    fn embedding_dimension(&self) -> usize;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_respects_ceiling() {
        let long = "x".repeat(MAX_EMBED_CHARS + 500);
        let truncated = truncate_for_embedding(&long);
        assert_eq!(truncated.chars().count(), MAX_EMBED_CHARS);

        let short = "fits as-is";
        assert_eq!(truncate_for_embedding(short), short);
    }
}

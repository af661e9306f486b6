use async_trait::async_trait;

#[derive(Debug)]
pub enum GenerationProviderError {
    NetworkError(String),
    ApiError(String),
    InvalidResponse(String),
    RateLimitExceeded,
}

impl std::fmt::Display for GenerationProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerationProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            GenerationProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            GenerationProviderError::InvalidResponse(msg) => {
                write!(f, "Invalid response format: {}", msg)
            }
            GenerationProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
        }
    }
}

impl std::error::Error for GenerationProviderError {}

#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[derive(Debug, Clone)]
pub struct GenerationResponse {
    pub text: String,
    pub model_name: String,
}

/// Opaque text-generation oracle. Used for answers and for golden-question
/// synthesis; no retry policy of its own.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    async fn generate(
        &self,
        request: GenerationRequest,
    ) -> Result<GenerationResponse, GenerationProviderError>;

    fn model_info(&self) -> String;
}

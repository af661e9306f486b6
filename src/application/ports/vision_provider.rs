use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::entities::{ImageQuality, TextConfidence};

#[derive(Debug)]
pub enum VisionProviderError {
    NetworkError(String),
    ApiError(String),
    /// The oracle answered but the payload did not match the extraction
    /// schema. Kept separate from ApiError so callers can tell a flaky
    /// service from a contract break.
    InvalidResponse(String),
    RateLimitExceeded,
}

impl std::fmt::Display for VisionProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VisionProviderError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            VisionProviderError::ApiError(msg) => write!(f, "API error: {}", msg),
            VisionProviderError::InvalidResponse(msg) => {
                write!(f, "Invalid response format: {}", msg)
            }
            VisionProviderError::RateLimitExceeded => write!(f, "Rate limit exceeded"),
        }
    }
}

impl std::error::Error for VisionProviderError {}

/// Typed schema for the vision oracle's structured-JSON extraction. Parsed
/// defensively at the boundary; a shape mismatch is `InvalidResponse`, not a
/// silently missing field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionExtraction {
    pub extracted_text: Option<String>,
    pub text_confidence: TextConfidence,
    pub caption: Option<String>,
    pub figure_type: String,
    #[serde(default)]
    pub detected_components: Vec<String>,
    #[serde(default)]
    pub semantic_tags: Vec<String>,
    #[serde(default)]
    pub entities: serde_json::Value,
    pub technical_complexity: String,
    pub image_quality: ImageQuality,
}

#[async_trait]
pub trait VisionProvider: Send + Sync {
    /// Run OCR + structured metadata extraction over the image at the given
    /// URL.
    async fn analyze_figure(
        &self,
        image_url: &str,
    ) -> Result<VisionExtraction, VisionProviderError>;
}

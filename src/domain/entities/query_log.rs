use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    High,
    Medium,
    Low,
}

impl QualityTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::High => "high",
            QualityTier::Medium => "medium",
            QualityTier::Low => "low",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "high" => Ok(QualityTier::High),
            "medium" => Ok(QualityTier::Medium),
            "low" => Ok(QualityTier::Low),
            _ => Err(format!("Invalid quality tier: {}", s)),
        }
    }

    pub fn from_score(score: f32) -> Self {
        if score >= 0.8 {
            QualityTier::High
        } else if score >= 0.5 {
            QualityTier::Medium
        } else {
            QualityTier::Low
        }
    }
}

/// One answered question, appended per orchestrator invocation and never
/// mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryLog {
    id: Uuid,
    query_text: String,
    response_text: String,
    manual_id: Option<String>,
    tenant_id: String,
    quality_score: f32,
    quality_tier: QualityTier,
    claim_coverage: Option<f32>,
    numeric_flags: Option<i32>,
    retrieval_method: String,
    adaptive_mode: String,
    model_name: String,
    created_at: DateTime<Utc>,
}

impl QueryLog {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        query_text: String,
        response_text: String,
        manual_id: Option<String>,
        tenant_id: String,
        quality_score: f32,
        claim_coverage: Option<f32>,
        numeric_flags: Option<i32>,
        retrieval_method: String,
        adaptive_mode: String,
        model_name: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            query_text,
            response_text,
            manual_id,
            tenant_id,
            quality_tier: QualityTier::from_score(quality_score),
            quality_score,
            claim_coverage,
            numeric_flags,
            retrieval_method,
            adaptive_mode,
            model_name,
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn query_text(&self) -> &str {
        &self.query_text
    }

    pub fn response_text(&self) -> &str {
        &self.response_text
    }

    pub fn manual_id(&self) -> Option<&str> {
        self.manual_id.as_deref()
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn quality_score(&self) -> f32 {
        self.quality_score
    }

    pub fn quality_tier(&self) -> QualityTier {
        self.quality_tier
    }

    pub fn claim_coverage(&self) -> Option<f32> {
        self.claim_coverage
    }

    pub fn numeric_flags(&self) -> Option<i32> {
        self.numeric_flags
    }

    pub fn retrieval_method(&self) -> &str {
        &self.retrieval_method
    }

    pub fn adaptive_mode(&self) -> &str {
        &self.adaptive_mode
    }

    pub fn model_name(&self) -> &str {
        &self.model_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

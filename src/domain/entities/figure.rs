use chrono::{DateTime, Utc};
use pgvector::Vector;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// OCR lifecycle of a figure. pending -> processing -> success | failed.
/// A failed figure stays failed until an external re-drive resets it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OcrStatus {
    Pending,
    Processing,
    Success,
    Failed,
}

impl OcrStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OcrStatus::Pending => "pending",
            OcrStatus::Processing => "processing",
            OcrStatus::Success => "success",
            OcrStatus::Failed => "failed",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "pending" => Ok(OcrStatus::Pending),
            "processing" => Ok(OcrStatus::Processing),
            "success" => Ok(OcrStatus::Success),
            "failed" => Ok(OcrStatus::Failed),
            _ => Err(format!("Invalid OCR status: {}", s)),
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OcrStatus::Success | OcrStatus::Failed)
    }
}

/// Confidence the vision oracle reports for its extracted text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextConfidence {
    None,
    Low,
    Medium,
    High,
}

impl TextConfidence {
    pub fn as_str(&self) -> &'static str {
        match self {
            TextConfidence::None => "none",
            TextConfidence::Low => "low",
            TextConfidence::Medium => "medium",
            TextConfidence::High => "high",
        }
    }

    pub fn from_string(s: &str) -> Result<Self, String> {
        match s {
            "none" => Ok(TextConfidence::None),
            "low" => Ok(TextConfidence::Low),
            "medium" => Ok(TextConfidence::Medium),
            "high" => Ok(TextConfidence::High),
            _ => Err(format!("Invalid text confidence: {}", s)),
        }
    }
}

/// Four-level visual quality grade reported by the vision oracle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageQuality {
    Sharp,
    Acceptable,
    Blurry,
    Damaged,
}

impl ImageQuality {
    /// Quantized quality score used for retrieval weighting.
    pub fn score(&self) -> f32 {
        match self {
            ImageQuality::Sharp => 1.0,
            ImageQuality::Acceptable => 0.75,
            ImageQuality::Blurry => 0.5,
            ImageQuality::Damaged => 0.25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ImageQuality::Sharp => "sharp",
            ImageQuality::Acceptable => "acceptable",
            ImageQuality::Blurry => "blurry",
            ImageQuality::Damaged => "damaged",
        }
    }
}

/// Structured extraction result for one figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisionMetadata {
    pub figure_type: String,
    pub detected_components: Vec<String>,
    pub semantic_tags: Vec<String>,
    pub entities: serde_json::Value,
    pub technical_complexity: String,
    pub image_quality: ImageQuality,
}

/// An extracted image from a manual page, enriched by OCR and vision
/// metadata extraction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Figure {
    id: Uuid,
    manual_id: String,
    tenant_id: String,
    page_number: i32,
    storage_url: String,
    ocr_text: Option<String>,
    ocr_status: OcrStatus,
    ocr_error: Option<String>,
    ocr_confidence: Option<TextConfidence>,
    caption_text: Option<String>,
    vision_metadata: Option<VisionMetadata>,
    quality_score: Option<f32>,
    embedding_text: Option<String>,
    embedding: Option<Vector>,
    created_at: DateTime<Utc>,
}

impl Figure {
    pub fn new(
        manual_id: String,
        tenant_id: String,
        page_number: i32,
        storage_url: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            manual_id,
            tenant_id,
            page_number,
            storage_url,
            ocr_text: None,
            ocr_status: OcrStatus::Pending,
            ocr_error: None,
            ocr_confidence: None,
            caption_text: None,
            vision_metadata: None,
            quality_score: None,
            embedding_text: None,
            embedding: None,
            created_at: Utc::now(),
        }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn from_database(
        id: Uuid,
        manual_id: String,
        tenant_id: String,
        page_number: i32,
        storage_url: String,
        ocr_text: Option<String>,
        ocr_status: OcrStatus,
        ocr_error: Option<String>,
        ocr_confidence: Option<TextConfidence>,
        caption_text: Option<String>,
        vision_metadata: Option<VisionMetadata>,
        quality_score: Option<f32>,
        embedding_text: Option<String>,
        embedding: Option<Vector>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            manual_id,
            tenant_id,
            page_number,
            storage_url,
            ocr_text,
            ocr_status,
            ocr_error,
            ocr_confidence,
            caption_text,
            vision_metadata,
            quality_score,
            embedding_text,
            embedding,
            created_at,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn manual_id(&self) -> &str {
        &self.manual_id
    }

    pub fn tenant_id(&self) -> &str {
        &self.tenant_id
    }

    pub fn page_number(&self) -> i32 {
        self.page_number
    }

    pub fn storage_url(&self) -> &str {
        &self.storage_url
    }

    pub fn ocr_text(&self) -> Option<&str> {
        self.ocr_text.as_deref()
    }

    pub fn ocr_status(&self) -> OcrStatus {
        self.ocr_status
    }

    pub fn ocr_error(&self) -> Option<&str> {
        self.ocr_error.as_deref()
    }

    pub fn ocr_confidence(&self) -> Option<TextConfidence> {
        self.ocr_confidence
    }

    pub fn caption_text(&self) -> Option<&str> {
        self.caption_text.as_deref()
    }

    pub fn vision_metadata(&self) -> Option<&VisionMetadata> {
        self.vision_metadata.as_ref()
    }

    pub fn quality_score(&self) -> Option<f32> {
        self.quality_score
    }

    pub fn embedding_text(&self) -> Option<&str> {
        self.embedding_text.as_deref()
    }

    pub fn embedding(&self) -> Option<&Vector> {
        self.embedding.as_ref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn start_processing(&mut self) -> Result<(), String> {
        if self.ocr_status != OcrStatus::Pending {
            return Err(format!(
                "Figure {} is not pending: {}",
                self.id,
                self.ocr_status.as_str()
            ));
        }
        self.ocr_status = OcrStatus::Processing;
        Ok(())
    }

    pub fn complete_extraction(
        &mut self,
        ocr_text: Option<String>,
        confidence: TextConfidence,
        caption: Option<String>,
        metadata: VisionMetadata,
    ) {
        self.quality_score = Some(metadata.image_quality.score());
        self.ocr_text = ocr_text;
        self.ocr_confidence = Some(confidence);
        self.caption_text = caption;
        self.vision_metadata = Some(metadata);
        self.ocr_status = OcrStatus::Success;
        self.ocr_error = None;
    }

    pub fn fail_extraction(&mut self, error: String) {
        self.ocr_status = OcrStatus::Failed;
        self.ocr_error = Some(error);
    }

    pub fn set_embedding(&mut self, text: String, embedding: Vector) {
        self.embedding_text = Some(text);
        self.embedding = Some(embedding);
    }

    /// Text worth embedding: non-`none` confidence and at least 10 chars.
    pub fn embeddable_text(&self) -> Option<String> {
        let confidence = self.ocr_confidence?;
        if confidence == TextConfidence::None {
            return None;
        }
        let mut parts = Vec::new();
        if let Some(caption) = &self.caption_text {
            parts.push(caption.as_str());
        }
        if let Some(text) = &self.ocr_text {
            parts.push(text.as_str());
        }
        let combined = parts.join("\n");
        if combined.trim().chars().count() >= 10 {
            Some(combined)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figure() -> Figure {
        Figure::new(
            "m-1".to_string(),
            "t-1".to_string(),
            4,
            "s3://figures/m-1/p4.png".to_string(),
        )
    }

    fn metadata(quality: ImageQuality) -> VisionMetadata {
        VisionMetadata {
            figure_type: "wiring_diagram".to_string(),
            detected_components: vec!["relay".to_string()],
            semantic_tags: vec!["electrical".to_string()],
            entities: serde_json::json!({"wire_colors": ["red", "black"]}),
            technical_complexity: "medium".to_string(),
            image_quality: quality,
        }
    }

    #[test]
    fn test_quality_score_quantization() {
        assert_eq!(ImageQuality::Sharp.score(), 1.0);
        assert_eq!(ImageQuality::Acceptable.score(), 0.75);
        assert_eq!(ImageQuality::Blurry.score(), 0.5);
        assert_eq!(ImageQuality::Damaged.score(), 0.25);
    }

    #[test]
    fn test_extraction_lifecycle() {
        let mut fig = figure();
        fig.start_processing().unwrap();
        assert_eq!(fig.ocr_status(), OcrStatus::Processing);

        fig.complete_extraction(
            Some("Terminal block wiring: L1 to pin 3".to_string()),
            TextConfidence::High,
            Some("Figure 7: terminal block".to_string()),
            metadata(ImageQuality::Acceptable),
        );
        assert_eq!(fig.ocr_status(), OcrStatus::Success);
        assert_eq!(fig.quality_score(), Some(0.75));
        assert!(fig.ocr_error().is_none());
    }

    #[test]
    fn test_failure_records_error() {
        let mut fig = figure();
        fig.start_processing().unwrap();
        fig.fail_extraction("image download failed".to_string());
        assert_eq!(fig.ocr_status(), OcrStatus::Failed);
        assert_eq!(fig.ocr_error(), Some("image download failed"));
        assert!(fig.start_processing().is_err());
    }

    #[test]
    fn test_embeddable_text_requires_confidence_and_length() {
        let mut fig = figure();
        fig.start_processing().unwrap();
        fig.complete_extraction(
            Some("short".to_string()),
            TextConfidence::None,
            None,
            metadata(ImageQuality::Sharp),
        );
        assert!(fig.embeddable_text().is_none());

        let mut fig = figure();
        fig.start_processing().unwrap();
        fig.complete_extraction(
            Some("ab".to_string()),
            TextConfidence::Low,
            None,
            metadata(ImageQuality::Sharp),
        );
        assert!(fig.embeddable_text().is_none());

        let mut fig = figure();
        fig.start_processing().unwrap();
        fig.complete_extraction(
            Some("Replace fuse F2 with a 5A slow-blow".to_string()),
            TextConfidence::Medium,
            Some("Fuse panel".to_string()),
            metadata(ImageQuality::Sharp),
        );
        let text = fig.embeddable_text().unwrap();
        assert!(text.contains("Fuse panel"));
        assert!(text.contains("slow-blow"));
    }
}

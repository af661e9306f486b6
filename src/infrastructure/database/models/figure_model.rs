use chrono::{DateTime, Utc};
use diesel::prelude::*;
use pgvector::Vector;
use uuid::Uuid;

use crate::domain::entities::{Figure, OcrStatus, TextConfidence, VisionMetadata};
use crate::infrastructure::database::schema::manual_figures;

#[derive(Debug, Clone, Queryable, Selectable, Identifiable, QueryableByName)]
#[diesel(table_name = manual_figures)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ManualFigureModel {
    pub id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub page_number: i32,
    pub storage_url: String,
    pub ocr_text: Option<String>,
    pub ocr_status: String,
    pub ocr_error: Option<String>,
    pub ocr_confidence: Option<String>,
    pub caption_text: Option<String>,
    pub vision_metadata: Option<serde_json::Value>,
    pub quality_score: Option<f32>,
    pub embedding_text: Option<String>,
    pub embedding: Option<Vector>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, QueryableByName)]
pub struct FigureHitRow {
    #[diesel(embed)]
    pub figure: ManualFigureModel,
    #[diesel(sql_type = diesel::sql_types::Float4)]
    pub similarity: f32,
}

#[derive(Debug, Insertable, AsChangeset)]
#[diesel(table_name = manual_figures)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct NewManualFigureModel {
    pub id: Uuid,
    pub manual_id: String,
    pub tenant_id: String,
    pub page_number: i32,
    pub storage_url: String,
    pub ocr_text: Option<String>,
    pub ocr_status: String,
    pub ocr_error: Option<String>,
    pub ocr_confidence: Option<String>,
    pub caption_text: Option<String>,
    pub vision_metadata: Option<serde_json::Value>,
    pub quality_score: Option<f32>,
    pub embedding_text: Option<String>,
    pub embedding: Option<Vector>,
    pub created_at: DateTime<Utc>,
}

impl From<&Figure> for NewManualFigureModel {
    fn from(figure: &Figure) -> Self {
        Self {
            id: figure.id(),
            manual_id: figure.manual_id().to_string(),
            tenant_id: figure.tenant_id().to_string(),
            page_number: figure.page_number(),
            storage_url: figure.storage_url().to_string(),
            ocr_text: figure.ocr_text().map(|s| s.to_string()),
            ocr_status: figure.ocr_status().as_str().to_string(),
            ocr_error: figure.ocr_error().map(|s| s.to_string()),
            ocr_confidence: figure.ocr_confidence().map(|c| c.as_str().to_string()),
            caption_text: figure.caption_text().map(|s| s.to_string()),
            vision_metadata: figure
                .vision_metadata()
                .and_then(|m| serde_json::to_value(m).ok()),
            quality_score: figure.quality_score(),
            embedding_text: figure.embedding_text().map(|s| s.to_string()),
            embedding: figure.embedding().cloned(),
            created_at: figure.created_at(),
        }
    }
}

impl From<ManualFigureModel> for Figure {
    fn from(model: ManualFigureModel) -> Self {
        let vision_metadata: Option<VisionMetadata> = model
            .vision_metadata
            .and_then(|v| serde_json::from_value(v).ok());
        Figure::from_database(
            model.id,
            model.manual_id,
            model.tenant_id,
            model.page_number,
            model.storage_url,
            model.ocr_text,
            OcrStatus::from_string(&model.ocr_status).unwrap_or(OcrStatus::Pending),
            model.ocr_error,
            model
                .ocr_confidence
                .and_then(|c| TextConfidence::from_string(&c).ok()),
            model.caption_text,
            vision_metadata,
            model.quality_score,
            model.embedding_text,
            model.embedding,
            model.created_at,
        )
    }
}

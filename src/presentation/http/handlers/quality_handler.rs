use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::services::QualityService;
use crate::application::services::quality_service::{QualityServiceError, QualityTestType};
use crate::presentation::http::dto::{ApiResponse, QualityReportDto, QualityRequestDto};

pub struct QualityHandler {
    quality_service: Arc<QualityService>,
}

impl QualityHandler {
    pub fn new(quality_service: Arc<QualityService>) -> Self {
        Self { quality_service }
    }

    /// POST /manuals/{manual_id}/quality?tenant_id=...&test_type=all
    pub async fn evaluate(
        State(handler): State<Arc<QualityHandler>>,
        Path(manual_id): Path<String>,
        Query(params): Query<QualityRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let test_type = match params.test_type.as_deref() {
            None => QualityTestType::All,
            Some(raw) => match QualityTestType::from_string(raw) {
                Ok(t) => t,
                Err(msg) => {
                    return Ok((
                        StatusCode::BAD_REQUEST,
                        Json(ApiResponse::error(
                            "INVALID_TEST_TYPE".to_string(),
                            msg,
                            None,
                        )),
                    ));
                }
            },
        };

        match handler
            .quality_service
            .evaluate(&manual_id, &params.tenant_id, test_type)
            .await
        {
            Ok(report) => Ok((
                StatusCode::OK,
                Json(ApiResponse::<QualityReportDto>::success(
                    QualityReportDto::from(report),
                )),
            )),
            Err(QualityServiceError::ValidationError(msg)) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error(
                    "MANUAL_NOT_INDEXED".to_string(),
                    msg,
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "QUALITY_EVALUATION_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}

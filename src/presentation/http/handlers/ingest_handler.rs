use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::services::IngestionService;
use crate::application::services::ingestion_service::{IngestRequest, IngestionServiceError};
use crate::domain::repositories::ProgressRepository;
use crate::infrastructure::messaging::{IngestJob, IngestQueue};
use crate::presentation::http::dto::{
    ApiResponse, IngestAcceptedDto, IngestRequestDto, MessageResponseDto, ProgressResponseDto,
    RetryResponseDto,
};

pub struct IngestHandler {
    ingestion_service: Arc<IngestionService>,
    progress_repository: Arc<dyn ProgressRepository>,
    job_queue: IngestQueue,
}

impl IngestHandler {
    pub fn new(
        ingestion_service: Arc<IngestionService>,
        progress_repository: Arc<dyn ProgressRepository>,
        job_queue: IngestQueue,
    ) -> Self {
        Self {
            ingestion_service,
            progress_repository,
            job_queue,
        }
    }

    /// POST /ingest: register the manual, queue its work, and kick off the
    /// first background batch. Returns 202; progress is polled separately.
    pub async fn ingest_manual(
        State(handler): State<Arc<IngestHandler>>,
        Json(body): Json<IngestRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let manual_id = body.manual_id.clone();
        let request = IngestRequest::from(body);

        match handler.ingestion_service.register_manual(request).await {
            Ok(summary) => {
                if handler
                    .job_queue
                    .enqueue(IngestJob::ChunkBatch {
                        manual_id: manual_id.clone(),
                    })
                    .is_err()
                {
                    return Ok((
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(ApiResponse::error(
                            "QUEUE_UNAVAILABLE".to_string(),
                            "Background workers are not running".to_string(),
                            None,
                        )),
                    ));
                }

                Ok((
                    StatusCode::ACCEPTED,
                    Json(ApiResponse::success(IngestAcceptedDto::from_summary(
                        manual_id, summary,
                    ))),
                ))
            }
            Err(IngestionServiceError::ValidationError(msg)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "INVALID_INGEST_REQUEST".to_string(),
                    msg,
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "INGEST_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    /// POST /manuals/{manual_id}/reingest: queue a full index rebuild.
    pub async fn reingest_manual(
        State(handler): State<Arc<IngestHandler>>,
        Path(manual_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        if handler
            .job_queue
            .enqueue(IngestJob::Reingest {
                manual_id: manual_id.clone(),
            })
            .is_err()
        {
            return Ok((
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::error(
                    "QUEUE_UNAVAILABLE".to_string(),
                    "Background workers are not running".to_string(),
                    None,
                )),
            ));
        }

        Ok((
            StatusCode::ACCEPTED,
            Json(ApiResponse::success(MessageResponseDto {
                message: format!("Re-ingestion of {} queued", manual_id),
            })),
        ))
    }

    /// POST /manuals/{manual_id}/retry: requeue failed chunks and schedule
    /// another batch pass.
    pub async fn retry_failed(
        State(handler): State<Arc<IngestHandler>>,
        Path(manual_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.ingestion_service.retry_failed(&manual_id).await {
            Ok(requeued) => {
                if requeued > 0
                    && handler
                        .job_queue
                        .enqueue(IngestJob::ChunkBatch {
                            manual_id: manual_id.clone(),
                        })
                        .is_err()
                {
                    return Ok((
                        StatusCode::SERVICE_UNAVAILABLE,
                        Json(ApiResponse::error(
                            "QUEUE_UNAVAILABLE".to_string(),
                            "Background workers are not running".to_string(),
                            None,
                        )),
                    ));
                }

                Ok((
                    StatusCode::OK,
                    Json(ApiResponse::success(RetryResponseDto {
                        manual_id,
                        requeued,
                    })),
                ))
            }
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "RETRY_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }

    /// GET /manuals/{manual_id}/progress
    pub async fn get_progress(
        State(handler): State<Arc<IngestHandler>>,
        Path(manual_id): Path<String>,
    ) -> Result<impl IntoResponse, StatusCode> {
        match handler.progress_repository.find_by_manual(&manual_id).await {
            Ok(Some(progress)) => Ok((
                StatusCode::OK,
                Json(ApiResponse::success(ProgressResponseDto::from(progress))),
            )),
            Ok(None) => Ok((
                StatusCode::NOT_FOUND,
                Json(ApiResponse::error(
                    "PROGRESS_NOT_FOUND".to_string(),
                    format!("No ingestion progress for manual {}", manual_id),
                    None,
                )),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "PROGRESS_LOOKUP_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::services::RagService;
use crate::application::services::rag_service::{AnswerRequest, RagServiceError};
use crate::presentation::http::dto::{ApiResponse, ChatRequestDto, ChatResponseDto};

pub struct ChatHandler {
    rag_service: Arc<RagService>,
}

impl ChatHandler {
    pub fn new(rag_service: Arc<RagService>) -> Self {
        Self { rag_service }
    }

    pub async fn chat(
        State(handler): State<Arc<ChatHandler>>,
        Json(body): Json<ChatRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = AnswerRequest::from(body);

        match handler.rag_service.answer(request).await {
            Ok(response) => Ok((
                StatusCode::OK,
                Json(ApiResponse::<ChatResponseDto>::success(
                    ChatResponseDto::from(response),
                )),
            )),
            Err(RagServiceError::ValidationError(msg)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "INVALID_QUESTION".to_string(),
                    msg,
                    None,
                )),
            )),
            Err(RagServiceError::GenerationError(msg)) => Ok((
                StatusCode::BAD_GATEWAY,
                Json(ApiResponse::error(
                    "GENERATION_FAILED".to_string(),
                    msg,
                    None,
                )),
            )),
        }
    }
}

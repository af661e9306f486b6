use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

use crate::application::services::RagService;
use crate::application::services::rag_service::{AnswerRequest, RagServiceError};
use crate::presentation::http::dto::SmsRequestDto;

/// SMS gateways consume plain text, so this handler skips the JSON envelope
/// entirely and returns the capped reply body as-is.
pub struct SmsHandler {
    rag_service: Arc<RagService>,
}

impl SmsHandler {
    pub fn new(rag_service: Arc<RagService>) -> Self {
        Self { rag_service }
    }

    pub async fn sms_reply(
        State(handler): State<Arc<SmsHandler>>,
        Json(body): Json<SmsRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        let request = AnswerRequest::from(body);

        match handler.rag_service.answer_for_sms(request).await {
            Ok(text) => Ok((StatusCode::OK, text)),
            Err(RagServiceError::ValidationError(msg)) => Ok((StatusCode::BAD_REQUEST, msg)),
            Err(RagServiceError::GenerationError(_)) => Ok((
                StatusCode::BAD_GATEWAY,
                "Sorry, we could not answer right now. Please try again.".to_string(),
            )),
        }
    }
}

use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::{ChatHandler, SmsHandler};

pub fn chat_routes(chat_handler: Arc<ChatHandler>, sms_handler: Arc<SmsHandler>) -> Router {
    let chat = Router::new()
        .route("/chat", post(ChatHandler::chat))
        .with_state(chat_handler);

    let sms = Router::new()
        .route("/sms", post(SmsHandler::sms_reply))
        .with_state(sms_handler);

    chat.merge(sms)
}

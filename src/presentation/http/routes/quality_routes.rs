use axum::{Router, routing::post};
use std::sync::Arc;

use crate::presentation::http::handlers::QualityHandler;

pub fn quality_routes(quality_handler: Arc<QualityHandler>) -> Router {
    Router::new()
        .route(
            "/manuals/{manual_id}/quality",
            post(QualityHandler::evaluate),
        )
        .with_state(quality_handler)
}

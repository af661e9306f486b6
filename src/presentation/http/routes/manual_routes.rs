use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::IngestHandler;

pub fn manual_routes(ingest_handler: Arc<IngestHandler>) -> Router {
    Router::new()
        .route("/ingest", post(IngestHandler::ingest_manual))
        .route(
            "/manuals/{manual_id}/reingest",
            post(IngestHandler::reingest_manual),
        )
        .route(
            "/manuals/{manual_id}/retry",
            post(IngestHandler::retry_failed),
        )
        .route(
            "/manuals/{manual_id}/progress",
            get(IngestHandler::get_progress),
        )
        .with_state(ingest_handler)
}

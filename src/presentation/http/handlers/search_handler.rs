use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use std::sync::Arc;

use crate::application::services::SearchEngine;
use crate::application::services::search_service::{SearchQuery, SearchServiceError};
use crate::presentation::http::dto::{ApiResponse, SearchRequestDto, SearchResponseDto};

pub struct SearchHandler {
    search_engine: Arc<dyn SearchEngine>,
}

impl SearchHandler {
    pub fn new(search_engine: Arc<dyn SearchEngine>) -> Self {
        Self { search_engine }
    }

    pub async fn search_content(
        State(handler): State<Arc<SearchHandler>>,
        Query(params): Query<SearchRequestDto>,
    ) -> Result<impl IntoResponse, StatusCode> {
        if params.query.trim().is_empty() {
            return Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error(
                    "EMPTY_QUERY".to_string(),
                    "Query cannot be empty".to_string(),
                    None,
                )),
            ));
        }

        let query = SearchQuery {
            query: params.query,
            manual_id: params.manual_id,
            tenant_id: params.tenant_id,
            top_k: params.top_k,
        };

        match handler.search_engine.search(query).await {
            Ok(results) => Ok((
                StatusCode::OK,
                Json(ApiResponse::<SearchResponseDto>::success(
                    SearchResponseDto::from(results),
                )),
            )),
            Err(SearchServiceError::ValidationError(msg)) => Ok((
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::error("INVALID_QUERY".to_string(), msg, None)),
            )),
            Err(e) => Ok((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ApiResponse::error(
                    "SEARCH_FAILED".to_string(),
                    e.to_string(),
                    None,
                )),
            )),
        }
    }
}

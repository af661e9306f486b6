use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tower_http::classify::ServerErrorsFailureClass;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::infrastructure::messaging::BackgroundProcessor;
use crate::presentation::http::{
    handlers::{ChatHandler, IngestHandler, QualityHandler, SearchHandler, SmsHandler},
    routes::{chat_routes, health_routes, manual_routes, quality_routes, search_routes},
};

pub struct HttpServer {
    ingest_handler: Arc<IngestHandler>,
    search_handler: Arc<SearchHandler>,
    chat_handler: Arc<ChatHandler>,
    sms_handler: Arc<SmsHandler>,
    quality_handler: Arc<QualityHandler>,
    background_processor: Arc<BackgroundProcessor>,
    port: u16,
}

impl HttpServer {
    pub fn new(
        ingest_handler: Arc<IngestHandler>,
        search_handler: Arc<SearchHandler>,
        chat_handler: Arc<ChatHandler>,
        sms_handler: Arc<SmsHandler>,
        quality_handler: Arc<QualityHandler>,
        background_processor: Arc<BackgroundProcessor>,
        port: Option<u16>,
    ) -> Self {
        Self {
            ingest_handler,
            search_handler,
            chat_handler,
            sms_handler,
            quality_handler,
            background_processor,
            port: port.unwrap_or(3000),
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        // Start background workers before accepting traffic.
        let background_processor = self.background_processor.clone();
        tokio::spawn(async move {
            background_processor.start().await;
        });

        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);

        let app = Router::new()
            .merge(health_routes())
            .merge(manual_routes(self.ingest_handler))
            .merge(search_routes(self.search_handler))
            .merge(chat_routes(self.chat_handler, self.sms_handler))
            .merge(quality_routes(self.quality_handler))
            .layer(cors)
            .layer(RequestBodyLimitLayer::new(50 * 1024 * 1024)) // 50MB of parsed page text
            .layer(
                TraceLayer::new_for_http()
                    .on_request(
                        |request: &axum::http::Request<axum::body::Body>, _span: &tracing::Span| {
                            tracing::info!(
                                "Received request: {} {}",
                                request.method(),
                                request.uri()
                            );
                        },
                    )
                    .on_response(
                        |response: &axum::http::Response<axum::body::Body>,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::info!(
                                "Response: {} (took {} ms)",
                                response.status(),
                                latency.as_millis()
                            );
                        },
                    )
                    .on_failure(
                        |error: ServerErrorsFailureClass,
                         latency: std::time::Duration,
                         _span: &tracing::Span| {
                            tracing::error!(
                                "Request failed: {:?} (took {} ms)",
                                error,
                                latency.as_millis()
                            );
                        },
                    ),
            );

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));

        let listener = TcpListener::bind(addr).await?;
        tracing::info!("Listening on {}", addr);
        axum::serve(listener, app).await?;

        Ok(())
    }
}

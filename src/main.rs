mod application;
mod domain;
mod infrastructure;
mod presentation;

use tracing_subscriber::EnvFilter;

use crate::infrastructure::container::AppContainer;
use crate::presentation::http::server::HttpServer;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let container = AppContainer::new().await?;

    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok());

    let server = HttpServer::new(
        container.ingest_handler,
        container.search_handler,
        container.chat_handler,
        container.sms_handler,
        container.quality_handler,
        container.background_processor,
        port,
    );

    server.run().await
}

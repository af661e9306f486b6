use std::sync::Arc;
use tracing::info;

use crate::application::ports::{EmbeddingProvider, GenerationProvider, VisionProvider};
use crate::application::services::figure_service::FigureEnrichmentConfig;
use crate::application::services::ingestion_service::IngestionConfig;
use crate::application::services::rag_service::RagConfig;
use crate::application::services::reingest_service::ReingestConfig;
use crate::application::services::chunking::ChunkingConfig;
use crate::application::services::search_service::SearchConfig;
use crate::application::services::{
    FigureService, IngestionService, QualityService, RagService, ReingestService, SearchEngine,
    SearchService,
};
use crate::domain::repositories::{
    ChunkRepository, FigureRepository, ManualRepository, ProgressRepository, QueryLogRepository,
    QueueRepository,
};
use crate::infrastructure::database::repositories::{
    PostgresChunkRepository, PostgresFigureRepository, PostgresManualRepository,
    PostgresProgressRepository, PostgresQueryLogRepository, PostgresQueueRepository,
};
use crate::infrastructure::database::{
    create_connection_pool, get_database_connection, run_migrations,
};
use crate::infrastructure::external_services::{
    InferenceEmbeddingProvider, RemoteGenerationProvider, RemoteVisionProvider,
};
use crate::infrastructure::messaging::{BackgroundProcessor, IngestQueue};
use crate::presentation::http::handlers::{
    ChatHandler, IngestHandler, QualityHandler, SearchHandler, SmsHandler,
};

/// Composition root: builds the pool, runs migrations, and wires every
/// repository, provider, service, and handler once at startup.
pub struct AppContainer {
    pub manual_repository: Arc<dyn ManualRepository>,
    pub chunk_repository: Arc<dyn ChunkRepository>,
    pub queue_repository: Arc<dyn QueueRepository>,
    pub figure_repository: Arc<dyn FigureRepository>,
    pub progress_repository: Arc<dyn ProgressRepository>,
    pub query_log_repository: Arc<dyn QueryLogRepository>,

    pub embedding_provider: Arc<dyn EmbeddingProvider>,
    pub generation_provider: Arc<dyn GenerationProvider>,
    pub vision_provider: Arc<dyn VisionProvider>,

    pub ingestion_service: Arc<IngestionService>,
    pub figure_service: Arc<FigureService>,
    pub reingest_service: Arc<ReingestService>,
    pub search_engine: Arc<dyn SearchEngine>,
    pub rag_service: Arc<RagService>,
    pub quality_service: Arc<QualityService>,

    pub ingest_queue: IngestQueue,
    pub background_processor: Arc<BackgroundProcessor>,

    pub ingest_handler: Arc<IngestHandler>,
    pub search_handler: Arc<SearchHandler>,
    pub chat_handler: Arc<ChatHandler>,
    pub sms_handler: Arc<SmsHandler>,
    pub quality_handler: Arc<QualityHandler>,
}

impl AppContainer {
    pub async fn new() -> Result<Self, Box<dyn std::error::Error>> {
        info!("Initializing application container");

        let pool = create_connection_pool()?;
        {
            let mut conn = get_database_connection()?;
            run_migrations(&mut conn)?;
        }
        info!("Database pool ready, migrations applied");

        let manual_repository: Arc<dyn ManualRepository> =
            Arc::new(PostgresManualRepository::new(pool.clone()));
        let chunk_repository: Arc<dyn ChunkRepository> =
            Arc::new(PostgresChunkRepository::new(pool.clone()));
        let queue_repository: Arc<dyn QueueRepository> =
            Arc::new(PostgresQueueRepository::new(pool.clone()));
        let figure_repository: Arc<dyn FigureRepository> =
            Arc::new(PostgresFigureRepository::new(pool.clone()));
        let progress_repository: Arc<dyn ProgressRepository> =
            Arc::new(PostgresProgressRepository::new(pool.clone()));
        let query_log_repository: Arc<dyn QueryLogRepository> =
            Arc::new(PostgresQueryLogRepository::new(pool.clone()));

        let embedding_provider: Arc<dyn EmbeddingProvider> =
            Arc::new(InferenceEmbeddingProvider::from_env()?);
        let generation_provider: Arc<dyn GenerationProvider> =
            Arc::new(RemoteGenerationProvider::from_env()?);
        let vision_provider: Arc<dyn VisionProvider> = Arc::new(RemoteVisionProvider::from_env()?);

        let ingestion_service = Arc::new(IngestionService::new(
            manual_repository.clone(),
            queue_repository.clone(),
            chunk_repository.clone(),
            figure_repository.clone(),
            progress_repository.clone(),
            embedding_provider.clone(),
            IngestionConfig::from_env(),
        ));

        let figure_service = Arc::new(FigureService::new(
            figure_repository.clone(),
            progress_repository.clone(),
            vision_provider.clone(),
            embedding_provider.clone(),
            FigureEnrichmentConfig::from_env(),
        ));

        let reingest_service = Arc::new(ReingestService::new(
            manual_repository.clone(),
            chunk_repository.clone(),
            figure_repository.clone(),
            embedding_provider.clone(),
            ReingestConfig {
                chunking: ChunkingConfig::from_env(),
                ..ReingestConfig::default()
            },
        ));

        let search_engine: Arc<dyn SearchEngine> = Arc::new(SearchService::new(
            chunk_repository.clone(),
            figure_repository.clone(),
            embedding_provider.clone(),
            SearchConfig::from_env(),
        ));

        let rag_service = Arc::new(RagService::new(
            search_engine.clone(),
            generation_provider.clone(),
            query_log_repository.clone(),
            RagConfig::default(),
        ));

        let quality_service = Arc::new(QualityService::new(
            chunk_repository.clone(),
            figure_repository.clone(),
            search_engine.clone(),
            generation_provider.clone(),
        ));

        let (ingest_queue, job_receiver) = IngestQueue::create_pair();

        let worker_count = std::env::var("INGEST_WORKERS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);

        let background_processor = Arc::new(
            BackgroundProcessor::new(
                Arc::new(job_receiver),
                ingest_queue.clone(),
                ingestion_service.clone(),
                figure_service.clone(),
                reingest_service.clone(),
            )
            .with_worker_count(worker_count),
        );

        let ingest_handler = Arc::new(IngestHandler::new(
            ingestion_service.clone(),
            progress_repository.clone(),
            ingest_queue.clone(),
        ));
        let search_handler = Arc::new(SearchHandler::new(search_engine.clone()));
        let chat_handler = Arc::new(ChatHandler::new(rag_service.clone()));
        let sms_handler = Arc::new(SmsHandler::new(rag_service.clone()));
        let quality_handler = Arc::new(QualityHandler::new(quality_service.clone()));

        info!("Application container ready");

        Ok(Self {
            manual_repository,
            chunk_repository,
            queue_repository,
            figure_repository,
            progress_repository,
            query_log_repository,
            embedding_provider,
            generation_provider,
            vision_provider,
            ingestion_service,
            figure_service,
            reingest_service,
            search_engine,
            rag_service,
            quality_service,
            ingest_queue,
            background_processor,
            ingest_handler,
            search_handler,
            chat_handler,
            sms_handler,
            quality_handler,
        })
    }
}

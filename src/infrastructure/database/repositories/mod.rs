pub mod postgres_chunk_repository;
pub mod postgres_figure_repository;
pub mod postgres_manual_repository;
pub mod postgres_progress_repository;
pub mod postgres_query_log_repository;
pub mod postgres_queue_repository;

pub use postgres_chunk_repository::PostgresChunkRepository;
pub use postgres_figure_repository::PostgresFigureRepository;
pub use postgres_manual_repository::PostgresManualRepository;
pub use postgres_progress_repository::PostgresProgressRepository;
pub use postgres_query_log_repository::PostgresQueryLogRepository;
pub use postgres_queue_repository::PostgresQueueRepository;

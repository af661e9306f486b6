pub mod chunk_repository;
pub mod figure_repository;
pub mod manual_repository;
pub mod progress_repository;
pub mod query_log_repository;
pub mod queue_repository;

pub use chunk_repository::ChunkRepository;
pub use figure_repository::FigureRepository;
pub use manual_repository::ManualRepository;
pub use progress_repository::ProgressRepository;
pub use query_log_repository::QueryLogRepository;
pub use queue_repository::QueueRepository;

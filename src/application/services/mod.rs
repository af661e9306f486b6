pub mod answer_style;
pub mod chunk_metadata;
pub mod chunking;
pub mod figure_service;
pub mod ingestion_service;
pub mod quality_service;
pub mod rag_service;
pub mod reingest_service;
pub mod search_service;

#[cfg(test)]
pub mod test_support;

pub use figure_service::FigureService;
pub use ingestion_service::IngestionService;
pub use quality_service::QualityService;
pub use rag_service::RagService;
pub use reingest_service::ReingestService;
pub use search_service::{SearchEngine, SearchService};

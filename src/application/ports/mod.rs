pub mod embedding_provider;
pub mod generation_provider;
pub mod vision_provider;

pub use embedding_provider::EmbeddingProvider;
pub use generation_provider::GenerationProvider;
pub use vision_provider::VisionProvider;

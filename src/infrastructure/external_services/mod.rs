pub mod generation_client;
pub mod inference_client;
pub mod vision_client;

pub use generation_client::{GenerationClient, GenerationClientConfig, RemoteGenerationProvider};
pub use inference_client::{EmbeddingsClientConfig, InferenceClient, InferenceEmbeddingProvider};
pub use vision_client::{RemoteVisionProvider, VisionClient, VisionClientConfig};

pub mod chunk;
pub mod figure;
pub mod manual;
pub mod progress;
pub mod query_log;
pub mod queue_item;
pub mod retrieval;

pub use chunk::{ChunkFlags, ManualChunk, SectionType};
pub use figure::{Figure, ImageQuality, OcrStatus, TextConfidence, VisionMetadata};
pub use manual::Manual;
pub use progress::{IngestionProgress, IngestionState};
pub use query_log::{QualityTier, QueryLog};
pub use queue_item::{ChunkQueueItem, QueueStatus};
pub use retrieval::{RetrievalResult, RetrievalSource};

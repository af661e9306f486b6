pub mod chunk_model;
pub mod figure_model;
pub mod manual_model;
pub mod progress_model;
pub mod query_log_model;
pub mod queue_model;

pub use chunk_model::{ChunkHitRow, ManualChunkModel, NewManualChunkModel};
pub use figure_model::{FigureHitRow, ManualFigureModel, NewManualFigureModel};
pub use manual_model::{ManualModel, NewManualModel};
pub use progress_model::{IngestionProgressModel, NewIngestionProgressModel};
pub use query_log_model::NewQueryLogModel;
pub use queue_model::{ChunkQueueModel, NewChunkQueueModel};

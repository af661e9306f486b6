pub mod chat_handler;
pub mod ingest_handler;
pub mod quality_handler;
pub mod search_handler;
pub mod sms_handler;

pub use chat_handler::ChatHandler;
pub use ingest_handler::IngestHandler;
pub use quality_handler::QualityHandler;
pub use search_handler::SearchHandler;
pub use sms_handler::SmsHandler;

pub mod chat_routes;
pub mod health_routes;
pub mod manual_routes;
pub mod quality_routes;
pub mod search_routes;

pub use chat_routes::*;
pub use health_routes::*;
pub use manual_routes::*;
pub use quality_routes::*;
pub use search_routes::*;

pub mod http;
pub mod traits;

// Re-export
pub use http::HttpTaskClient;
pub use traits::{ApiError, TaskApi, CONNECT_ERROR_MESSAGE};

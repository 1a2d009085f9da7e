pub mod http;

pub use http::{router, ApiError, ApiServer, AppState, ErrorResponse};

pub mod chat_stream;
pub mod dto;
pub mod rate_limiter;
pub mod routes;

pub use rate_limiter::RateLimiter;
pub use routes::{create_router, AppState};

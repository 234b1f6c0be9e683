//! Middleware - password gate and rate limiting

pub mod auth;
pub mod rate_limit;

pub use auth::AuthGate;
pub use rate_limit::RateLimitLayer;

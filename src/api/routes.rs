//! Router construction

use axum::{
    http::{header::CONTENT_TYPE, Method},
    routing::{any, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::api::handlers;
use crate::middleware::RateLimitLayer;
use crate::AppState;

/// Build the application router with CORS, tracing and optional rate limiting
pub fn create_router(state: Arc<AppState>) -> Router {
    let rate_limit = state.settings.rate_limit.clone();

    let mut router = Router::new()
        .route("/api/models", any(handlers::list_models))
        .route("/api/prompts", any(handlers::list_prompts))
        .route("/api/config", any(handlers::get_config))
        .route("/api/auth/status", any(handlers::auth_status))
        .route(
            "/api/auth",
            post(handlers::login).fallback(handlers::fallback),
        )
        .fallback(handlers::fallback)
        .with_state(state);

    if rate_limit.enabled {
        router = router.layer(RateLimitLayer::new(
            rate_limit.requests_per_second,
            rate_limit.burst_size,
        ));
    }

    router.layer(TraceLayer::new_for_http()).layer(
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]),
    )
}

//! Functional tests for generation rate limiting

use axum::http::StatusCode;
use serde_json::json;

use crate::common::*;

fn limited_app(backend: std::sync::Arc<MockBackend>) -> axum::Router {
    let mut settings = test_settings();
    settings.rate_limit.enabled = true;
    settings.rate_limit.requests_per_second = 1;
    settings.rate_limit.burst_size = 1;
    app_with(settings, backend)
}

#[tokio::test]
async fn test_second_generation_is_limited() {
    let backend = MockBackend::images();
    let app = limited_app(backend.clone());
    let body = json!({ "prompt": "cat", "model": "flux-1-schnell" });

    let response = send(&app, post_json("/", body.clone())).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, post_json("/", body)).await;
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(body_json(response).await["error"].is_string());
    assert_eq!(backend.image_calls().len(), 1);
}

#[tokio::test]
async fn test_reads_are_not_limited() {
    let app = limited_app(MockBackend::images());

    for _ in 0..5 {
        let response = send(&app, get("/api/models")).await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_disabled_by_default() {
    let backend = MockBackend::images();
    let app = app(backend.clone());

    for _ in 0..5 {
        let response = send(
            &app,
            post_json("/", json!({ "prompt": "cat", "model": "flux-1-schnell" })),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
    }
    assert_eq!(backend.image_calls().len(), 5);
}

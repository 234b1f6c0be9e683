//! Functional tests for the listing endpoints, the page and routing

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use serde_json::json;
use text2img_gateway::catalog::{MODELS, PROMPTS};

use crate::common::*;

#[tokio::test]
async fn test_models_match_static_table() {
    let app = app(MockBackend::images());

    for _ in 0..2 {
        let response = send(&app, get("/api/models")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");

        let body = body_json(response).await;
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["id"].as_str().unwrap())
            .collect();
        let expected: Vec<&str> = MODELS.iter().map(|m| m.id).collect();
        assert_eq!(ids, expected);
    }
}

#[tokio::test]
async fn test_models_endpoint_ignores_method() {
    let app = app(MockBackend::images());
    let response = send(&app, post_json("/api/models", json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), MODELS.len());
}

#[tokio::test]
async fn test_prompts() {
    let app = app(MockBackend::images());
    let body = body_json(send(&app, get("/api/prompts")).await).await;
    assert_eq!(body.as_array().unwrap().len(), PROMPTS.len());
    assert_eq!(body[0], PROMPTS[0]);
}

#[tokio::test]
async fn test_config_reports_password_requirement() {
    let app = app(MockBackend::images());
    let body = body_json(send(&app, get("/api/config")).await).await;
    assert_eq!(body, json!({ "require_password": false }));

    let mut settings = test_settings();
    settings.auth.passwords = vec!["admin123".to_string()];
    let app = app_with(settings, MockBackend::images());
    let body = body_json(send(&app, get("/api/config")).await).await;
    assert_eq!(body, json!({ "require_password": true }));
}

#[tokio::test]
async fn test_index_page_substitutes_host() {
    let app = app(MockBackend::images());

    for uri in ["/", "/index.html", "/nested/page.html"] {
        let response = send(
            &app,
            Request::builder()
                .uri(uri)
                .header("host", "draw.example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        assert_eq!(response.headers()["content-type"], "text/html");

        let page = String::from_utf8(body_bytes(response).await).unwrap();
        assert!(page.contains("draw.example.com"));
        assert!(!page.contains("{{host}}"));
    }
}

#[tokio::test]
async fn test_unknown_get_is_not_found() {
    let app = app(MockBackend::images());

    for uri in ["/favicon.ico", "/api/unknown", "/api/auth"] {
        let response = send(&app, get(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(body_bytes(response).await, b"Not Found");
    }
}

#[tokio::test]
async fn test_options_returns_empty_ok() {
    let app = app(MockBackend::images());

    for uri in ["/", "/api/models", "/anything"] {
        let response = send(
            &app,
            Request::builder()
                .method("OPTIONS")
                .uri(uri)
                .header("origin", "https://example.com")
                .header("access-control-request-method", "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["access-control-allow-origin"], "*");
        assert!(body_bytes(response).await.is_empty());
    }
}

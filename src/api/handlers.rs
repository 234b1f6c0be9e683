//! HTTP handlers

use axum::{
    body::Bytes,
    extract::State,
    http::{
        header::{CONTENT_TYPE, HOST, SET_COOKIE},
        HeaderMap, Method, StatusCode, Uri,
    },
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::catalog::{self, MODELS, PROMPTS};
use crate::error::{AppError, Result};
use crate::generation::{normalizer::seed_of, GenerationRequest};
use crate::response::GenerationResult;
use crate::AppState;

/// GET /api/models
pub async fn list_models() -> impl IntoResponse {
    Json(MODELS)
}

/// GET /api/prompts
pub async fn list_prompts() -> impl IntoResponse {
    Json(PROMPTS)
}

/// GET /api/config
pub async fn get_config(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({ "require_password": state.auth.password_required() }))
}

/// GET /api/auth/status
pub async fn auth_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let authed = !state.auth.password_required() || state.auth.cookie_authed(&headers);
    let status = if authed {
        StatusCode::OK
    } else {
        StatusCode::UNAUTHORIZED
    };
    (status, Json(json!({ "authed": authed })))
}

#[derive(Debug, Default, Deserialize)]
struct LoginRequest {
    #[serde(default)]
    password: Option<String>,
}

/// POST /api/auth
pub async fn login(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Response> {
    // An unreadable body is just a missing password
    let request: LoginRequest = serde_json::from_slice(&body).unwrap_or_default();

    if !state.auth.check_password(request.password.as_deref()) {
        warn!("Login attempt with wrong password");
        return Err(AppError::Forbidden("密码错误".to_string()));
    }

    info!("Issued auth cookie");
    Ok((
        [(SET_COOKIE, state.auth.set_cookie_header())],
        Json(json!({ "success": true })),
    )
        .into_response())
}

/// POST to any other path: generate images
pub async fn generate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<GenerationResult> {
    let request: GenerationRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::MalformedBody(e.to_string()))?;

    if !state.auth.is_authed(&headers, request.password.as_deref()) {
        return Err(AppError::Forbidden("需要正确的访问密码".to_string()));
    }

    if !request.has_required_fields() {
        return Err(AppError::InvalidRequest(
            "Missing required parameter: prompt or model".to_string(),
        ));
    }

    let model = request
        .model
        .as_deref()
        .and_then(catalog::find_model)
        .ok_or_else(|| AppError::InvalidRequest("Model is invalid".to_string()))?;

    let inputs = state.normalizer.normalize(model, &request).await?;
    let prompt_preview: String = inputs
        .get("prompt")
        .and_then(|p| p.as_str())
        .unwrap_or_default()
        .chars()
        .take(50)
        .collect();
    info!(model = %model.key, prompt = %prompt_preview, "Generating image");

    let outcome = state
        .batcher
        .run(model.id, model.key, &inputs, request.output_count())
        .await?;

    GenerationResult::shape(model.id, seed_of(&inputs), outcome)
}

/// The front end page with `{{host}}` replaced by the request host
pub async fn index(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let host = headers
        .get(HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or_default();
    (
        [(CONTENT_TYPE, "text/html")],
        state.index_html.replace("{{host}}", host),
    )
}

/// Everything without a dedicated route: generation, the page, or 404
pub async fn fallback(
    state: State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    if method == Method::POST {
        return generate(state, headers, body).await.into_response();
    }

    let path = uri.path();
    if path == "/" || path.ends_with(".html") {
        return index(state, headers).await.into_response();
    }

    (StatusCode::NOT_FOUND, "Not Found").into_response()
}

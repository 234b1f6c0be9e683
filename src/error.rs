//! Common error types for the image generation gateway

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Client input the gateway refuses to forward
    #[error("{0}")]
    InvalidRequest(String),

    /// Request body could not be parsed as JSON
    #[error("Invalid JSON body: {0}")]
    MalformedBody(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    RateLimited(String),

    /// The inference service rejected a call or replied with an error envelope
    #[error("{0}")]
    BackendResponse(String),

    /// An inference call failed outright
    #[error("Image generation failed: {details}")]
    GenerationFailed { model: String, details: String },

    /// The inference service answered with something we cannot use
    #[error("{message}: {details}")]
    Upstream { message: String, details: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn upstream(message: impl Into<String>, details: impl Into<String>) -> Self {
        AppError::Upstream {
            message: message.into(),
            details: details.into(),
        }
    }
}

/// JSON error body returned to clients
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: None,
            model: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::InvalidRequest(message) => {
                (StatusCode::BAD_REQUEST, ErrorResponse::new(message))
            }
            AppError::MalformedBody(details) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Invalid JSON body").with_details(details),
            ),
            AppError::Forbidden(message) => (StatusCode::FORBIDDEN, ErrorResponse::new(message)),
            AppError::RateLimited(message) => {
                (StatusCode::TOO_MANY_REQUESTS, ErrorResponse::new(message))
            }
            AppError::GenerationFailed { model, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse {
                    error: "Image generation failed".to_string(),
                    details: Some(details),
                    model: Some(model),
                },
            ),
            AppError::BackendResponse(details) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Inference service error").with_details(details),
            ),
            AppError::Upstream { message, details } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(message).with_details(details),
            ),
            other @ (AppError::Config(_)
            | AppError::Io(_)
            | AppError::HttpClient(_)
            | AppError::Internal(_)) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new("Internal server error").with_details(other.to_string()),
            ),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;

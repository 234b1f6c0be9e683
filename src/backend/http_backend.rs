//! Workers AI REST client

use async_trait::async_trait;
use reqwest::{header::CONTENT_TYPE, Client};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::backend::traits::{InferenceBackend, InferenceOutput, ModelInputs};
use crate::config::InferenceConfig;
use crate::error::{AppError, Result};

/// Calls `POST {base_url}/accounts/{account_id}/ai/run/{model}`
pub struct WorkersAiBackend {
    client: Client,
    base_url: String,
    account_id: String,
    api_token: String,
}

/// Envelope wrapping every JSON reply of the REST API
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    errors: Vec<ApiMessage>,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: String,
}

impl WorkersAiBackend {
    /// Create a new backend from configuration
    pub fn new(config: &InferenceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            account_id: config.account_id.clone(),
            api_token: config.api_token.clone(),
        })
    }

    fn run_url(&self, model_key: &str) -> String {
        format!(
            "{}/accounts/{}/ai/run/{}",
            self.base_url, self.account_id, model_key
        )
    }
}

fn describe_errors(errors: &[ApiMessage]) -> String {
    if errors.is_empty() {
        return "unknown error".to_string();
    }
    errors
        .iter()
        .map(|e| match e.code {
            Some(code) => format!("{} ({})", e.message, code),
            None => e.message.clone(),
        })
        .collect::<Vec<_>>()
        .join("; ")
}

/// Unwrap the `{success, result, errors}` envelope, tolerating bare JSON
fn unwrap_envelope(body: Value) -> Result<Value> {
    let is_envelope = body
        .as_object()
        .map(|o| o.contains_key("result") || o.contains_key("success"))
        .unwrap_or(false);
    if !is_envelope {
        return Ok(body);
    }

    let envelope: ApiEnvelope = serde_json::from_value(body)
        .map_err(|e| AppError::BackendResponse(format!("Malformed API envelope: {}", e)))?;

    if envelope.success == Some(false) {
        return Err(AppError::BackendResponse(describe_errors(&envelope.errors)));
    }

    envelope
        .result
        .ok_or_else(|| AppError::BackendResponse("API response has no result".to_string()))
}

#[async_trait]
impl InferenceBackend for WorkersAiBackend {
    fn name(&self) -> &str {
        "workers-ai"
    }

    async fn run(&self, model_key: &str, inputs: ModelInputs) -> Result<InferenceOutput> {
        let url = self.run_url(model_key);
        debug!(model = %model_key, "Sending inference request");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_token)
            .json(&inputs)
            .send()
            .await?;

        let status = response.status();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_ascii_lowercase();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let details = serde_json::from_str::<ApiEnvelope>(&body)
                .ok()
                .filter(|e| !e.errors.is_empty())
                .map(|e| describe_errors(&e.errors))
                .unwrap_or(body);
            warn!(model = %model_key, status = %status, "Inference request rejected");
            return Err(AppError::BackendResponse(format!(
                "Inference service returned {}: {}",
                status, details
            )));
        }

        if content_type.starts_with("application/json") {
            let body: Value = response.json().await?;
            return unwrap_envelope(body).map(InferenceOutput::Json);
        }

        let bytes = response.bytes().await?;
        debug!(model = %model_key, size = bytes.len(), content_type = %content_type, "Received binary output");
        Ok(InferenceOutput::Binary(bytes.to_vec()))
    }
}

//! Response shaping - turns batch outcomes into PNG or JSON responses

pub mod base64;
pub mod payload;

use axum::{
    http::{header::CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::error::Result;
use crate::generation::{BatchOutcome, Seed};
pub use payload::ImagePayload;

pub const X_USED_MODEL: HeaderName = HeaderName::from_static("x-used-model");
pub const X_SEED: HeaderName = HeaderName::from_static("x-seed");
pub const X_IMAGE_BYTES: HeaderName = HeaderName::from_static("x-image-bytes");
pub const X_SERVER_SECONDS: HeaderName = HeaderName::from_static("x-server-seconds");

/// Body of a successful generation
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationBody {
    /// Several images as data URLs
    Images(Vec<String>),
    /// A single decoded PNG
    Png(Vec<u8>),
}

#[derive(Serialize)]
struct ImagesResponse<'a> {
    images: &'a [String],
}

/// A generation ready to be sent, with its diagnostic metadata
#[derive(Debug, Clone)]
pub struct GenerationResult {
    pub body: GenerationBody,
    pub used_model: String,
    pub seed: Option<Seed>,
    pub server_seconds: f64,
}

impl GenerationResult {
    /// Classify every output and build the response body.
    ///
    /// One output becomes a PNG body; more become `{images: [...]}`.
    pub fn shape(model_id: &str, seed: Option<Seed>, outcome: BatchOutcome) -> Result<Self> {
        let server_seconds = outcome.average_seconds();
        let mut payloads = outcome
            .outputs
            .into_iter()
            .map(|o| ImagePayload::classify(o.output))
            .collect::<Result<Vec<_>>>()?;

        let body = if payloads.len() == 1 {
            let payload = payloads.remove(0);
            GenerationBody::Png(payload.into_bytes()?)
        } else {
            GenerationBody::Images(payloads.iter().map(ImagePayload::to_data_url).collect())
        };

        Ok(Self {
            body,
            used_model: model_id.to_string(),
            seed,
            server_seconds,
        })
    }
}

fn header_value(value: impl ToString) -> Option<HeaderValue> {
    HeaderValue::from_str(&value.to_string()).ok()
}

impl IntoResponse for GenerationResult {
    fn into_response(self) -> Response {
        let mut headers = HeaderMap::new();
        if let Some(v) = header_value(&self.used_model) {
            headers.insert(X_USED_MODEL, v);
        }
        if let Some(v) = header_value(format!("{:.3}", self.server_seconds)) {
            headers.insert(X_SERVER_SECONDS, v);
        }

        match self.body {
            GenerationBody::Images(images) => {
                (headers, Json(ImagesResponse { images: &images })).into_response()
            }
            GenerationBody::Png(bytes) => {
                if let Some(v) = self.seed.as_ref().and_then(header_value) {
                    headers.insert(X_SEED, v);
                }
                headers.insert(X_IMAGE_BYTES, HeaderValue::from(bytes.len()));
                (headers, [(CONTENT_TYPE, "image/png")], bytes).into_response()
            }
        }
    }
}

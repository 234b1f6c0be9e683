//! Classification of raw inference output into image payloads

use serde_json::Value;

use crate::backend::InferenceOutput;
use crate::error::{AppError, Result};
use crate::response::base64;

/// An image returned by the inference service
#[derive(Debug, Clone, PartialEq)]
pub enum ImagePayload {
    /// JSON document carrying a base64 PNG in its `image` field
    JsonImage { base64: String },
    /// Raw PNG bytes
    BinaryImage { bytes: Vec<u8> },
}

impl ImagePayload {
    /// Decide what kind of image an upstream reply carries
    pub fn classify(output: InferenceOutput) -> Result<Self> {
        match output {
            InferenceOutput::Binary(bytes) => Ok(ImagePayload::BinaryImage { bytes }),
            InferenceOutput::Json(Value::String(text)) => {
                let parsed: Value = serde_json::from_str(&text)
                    .map_err(|e| AppError::upstream("Failed to parse response", e.to_string()))?;
                Self::from_json(parsed)
            }
            InferenceOutput::Json(value) => Self::from_json(value),
        }
    }

    fn from_json(value: Value) -> Result<Self> {
        match value.get("image").and_then(Value::as_str) {
            Some(image) if !image.is_empty() => Ok(ImagePayload::JsonImage {
                base64: image.to_string(),
            }),
            _ => Err(AppError::upstream(
                "Invalid response format",
                "Image data not found in response",
            )),
        }
    }

    /// Decoded image bytes
    pub fn into_bytes(self) -> Result<Vec<u8>> {
        match self {
            ImagePayload::JsonImage { base64: encoded } => base64::decode(&encoded),
            ImagePayload::BinaryImage { bytes } => Ok(bytes),
        }
    }

    /// `data:image/png;base64,...` form, reusing upstream base64 when present
    pub fn to_data_url(&self) -> String {
        match self {
            ImagePayload::JsonImage { base64: encoded } => {
                base64::data_url_from_base64(encoded, "png")
            }
            ImagePayload::BinaryImage { bytes } => base64::create_data_url(bytes, "png"),
        }
    }
}

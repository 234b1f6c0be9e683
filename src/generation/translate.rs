//! Best-effort prompt translation to English

use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::backend::{InferenceBackend, InferenceOutput, ModelInputs};
use crate::config::TranslationConfig;

const SYSTEM_INSTRUCTION: &str = "You are a professional translator. Translate the user text into natural, concise English. Output English translation only, no quotes, no explanations.";

/// Translates non-English prompt text through a chat model
#[derive(Clone)]
pub struct Translator {
    backend: Option<Arc<dyn InferenceBackend>>,
    model: String,
}

/// Pure ASCII text is assumed to already be English
pub fn needs_translation(text: &str) -> bool {
    !text.is_ascii()
}

impl Translator {
    pub fn new(backend: Arc<dyn InferenceBackend>, config: &TranslationConfig) -> Self {
        Self {
            backend: config.enabled.then_some(backend),
            model: config.model.clone(),
        }
    }

    /// Translate `text` when it looks non-English; never fails
    pub async fn to_english(&self, text: &str) -> String {
        if text.is_empty() || !needs_translation(text) {
            return text.to_string();
        }
        let Some(backend) = &self.backend else {
            return text.to_string();
        };

        let mut inputs = ModelInputs::new();
        inputs.insert(
            "messages",
            json!([
                { "role": "system", "content": SYSTEM_INSTRUCTION },
                { "role": "user", "content": format!("Translate into English:\n{}", text) },
            ]),
        );
        inputs.insert("temperature", json!(0.2));

        match backend.run(&self.model, inputs).await {
            Ok(output) => match extract_translation(&output) {
                Some(translated) => {
                    debug!(chars = text.chars().count(), "Translated prompt text");
                    translated
                }
                None => {
                    debug!("Translation response had no usable text");
                    text.to_string()
                }
            },
            Err(e) => {
                debug!(error = %e, "Translation failed, keeping original text");
                text.to_string()
            }
        }
    }
}

/// Pull the translated text out of a chat model response
fn extract_translation(output: &InferenceOutput) -> Option<String> {
    let value = match output {
        InferenceOutput::Json(value) => value,
        InferenceOutput::Binary(bytes) => {
            return non_empty(std::str::from_utf8(bytes).ok()?);
        }
    };

    match value {
        Value::String(s) => non_empty(s),
        Value::Object(map) => {
            for key in ["response", "text", "output"] {
                if let Some(found) = map.get(key).and_then(Value::as_str).and_then(non_empty) {
                    return Some(found);
                }
            }
            value
                .pointer("/choices/0/message/content")
                .and_then(Value::as_str)
                .and_then(non_empty)
        }
        _ => None,
    }
}

fn non_empty(text: &str) -> Option<String> {
    let trimmed = text.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

//! Common traits and types for inference backends

use async_trait::async_trait;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;

use crate::error::Result;

/// Raw result of one inference call, before any interpretation
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceOutput {
    /// The service answered with a JSON document
    Json(Value),
    /// The service answered with raw bytes (typically a PNG)
    Binary(Vec<u8>),
}

/// JSON object sent to a model for one call.
///
/// Image fields are kept as shared byte buffers and only expanded into JSON
/// arrays while the request body is written, so cloning inputs for every
/// output of a batch never copies them.
#[derive(Debug, Clone, Default)]
pub struct ModelInputs {
    fields: Map<String, Value>,
    images: Vec<(String, Arc<Vec<u8>>)>,
}

impl ModelInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        let key = key.into();
        self.images.retain(|(k, _)| *k != key);
        self.fields.insert(key, value);
    }

    /// Add an image field, serialized as an array of byte values
    pub fn insert_image(&mut self, key: impl Into<String>, bytes: Arc<Vec<u8>>) {
        let key = key.into();
        self.fields.remove(&key);
        self.images.retain(|(k, _)| *k != key);
        self.images.push((key, bytes));
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn image(&self, key: &str) -> Option<&Arc<Vec<u8>>> {
        self.images
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, bytes)| bytes)
    }

    pub fn len(&self) -> usize {
        self.fields.len() + self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl From<Map<String, Value>> for ModelInputs {
    fn from(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            images: Vec::new(),
        }
    }
}

impl Serialize for ModelInputs {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in &self.fields {
            map.serialize_entry(key, value)?;
        }
        for (key, bytes) in &self.images {
            map.serialize_entry(key, bytes.as_slice())?;
        }
        map.end()
    }
}

/// Trait for hosted inference services
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Backend name used in logs
    fn name(&self) -> &str;

    /// Run a model with the given inputs
    async fn run(&self, model_key: &str, inputs: ModelInputs) -> Result<InferenceOutput>;
}

//! Parallel fan-out of one request into several inference calls

use futures::future::try_join_all;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::backend::{InferenceBackend, InferenceOutput, ModelInputs};
use crate::error::{AppError, Result};
use crate::generation::request::Seed;

/// Upper bound on outputs per request
pub const MAX_OUTPUTS: usize = 8;

/// Result of one inference call
#[derive(Debug, Clone)]
pub struct TimedOutput {
    pub output: InferenceOutput,
    pub seconds: f64,
}

/// All outputs of a batch, in index order
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub outputs: Vec<TimedOutput>,
}

impl BatchOutcome {
    /// Mean wall-clock seconds per call
    pub fn average_seconds(&self) -> f64 {
        if self.outputs.is_empty() {
            return 0.0;
        }
        self.outputs.iter().map(|o| o.seconds).sum::<f64>() / self.outputs.len() as f64
    }
}

/// Issues up to [`MAX_OUTPUTS`] concurrent calls and joins them
pub struct Batcher {
    backend: Arc<dyn InferenceBackend>,
}

/// Inputs for the `index`-th call; numeric seeds are offset by the index.
///
/// Image buffers are shared with `inputs`, only scalar fields are copied.
pub fn inputs_for_index(inputs: &ModelInputs, index: usize) -> ModelInputs {
    let mut local = inputs.clone();
    if let Some(seed) = inputs.get("seed").and_then(Value::as_u64) {
        if index > 0 {
            local.insert("seed", json!(Seed::Numeric(seed).offset(index)));
        }
    }
    local
}

impl Batcher {
    pub fn new(backend: Arc<dyn InferenceBackend>) -> Self {
        Self { backend }
    }

    async fn run_once(&self, model_key: &str, inputs: ModelInputs) -> Result<TimedOutput> {
        let started = Instant::now();
        let output = self.backend.run(model_key, inputs).await?;
        Ok(TimedOutput {
            output,
            seconds: started.elapsed().as_secs_f64(),
        })
    }

    /// Run `count` calls (clamped into [1, MAX_OUTPUTS]); any failure fails the batch
    pub async fn run(
        &self,
        model_id: &str,
        model_key: &str,
        inputs: &ModelInputs,
        count: usize,
    ) -> Result<BatchOutcome> {
        let count = count.clamp(1, MAX_OUTPUTS);
        debug!(model = %model_id, count = count, backend = self.backend.name(), "Dispatching batch");

        let calls = (0..count).map(|i| self.run_once(model_key, inputs_for_index(inputs, i)));
        let outputs = try_join_all(calls).await.map_err(|e| {
            warn!(model = %model_id, error = %e, "Image generation failed");
            AppError::GenerationFailed {
                model: model_id.to_string(),
                details: e.to_string(),
            }
        })?;

        let outcome = BatchOutcome { outputs };
        info!(
            model = %model_id,
            count = count,
            avg_seconds = outcome.average_seconds(),
            "Batch completed"
        );
        Ok(outcome)
    }
}

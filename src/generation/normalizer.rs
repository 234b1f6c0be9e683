//! Per-family input normalization
//!
//! Every model family owns a strategy that turns a loosely typed client body
//! into the exact input object its Workers AI model expects.

use async_trait::async_trait;
use rand::Rng;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::debug;

use crate::backend::ModelInputs;
use crate::catalog::{ModelDescriptor, ModelFamily};
use crate::error::{AppError, Result};
use crate::generation::fetcher::{ImageFetcher, ImageRole};
use crate::generation::request::{GenerationRequest, Seed};
use crate::generation::translate::Translator;

pub const DEFAULT_PROMPT: &str = "cyberpunk cat";

/// Upper bound (exclusive) of generated seeds
const RANDOM_SEED_RANGE: u64 = 1024 * 1024;

/// Collaborators a strategy may need
pub struct InputNormalizer {
    translator: Translator,
    fetcher: ImageFetcher,
}

#[async_trait]
trait NormalizeStrategy: Send + Sync {
    async fn normalize(
        &self,
        normalizer: &InputNormalizer,
        request: &GenerationRequest,
        seed: Option<Seed>,
    ) -> Result<ModelInputs>;
}

struct FastStrategy;
struct ImageConditionedStrategy {
    with_mask: bool,
}
struct TextToImageStrategy;

static FAST: FastStrategy = FastStrategy;
static IMAGE_TO_IMAGE: ImageConditionedStrategy = ImageConditionedStrategy { with_mask: false };
static INPAINTING: ImageConditionedStrategy = ImageConditionedStrategy { with_mask: true };
static TEXT_TO_IMAGE: TextToImageStrategy = TextToImageStrategy;

fn strategy_for(family: ModelFamily) -> &'static dyn NormalizeStrategy {
    match family {
        ModelFamily::Fast => &FAST,
        ModelFamily::ImageToImage => &IMAGE_TO_IMAGE,
        ModelFamily::Inpainting => &INPAINTING,
        ModelFamily::TextToImage => &TEXT_TO_IMAGE,
    }
}

impl InputNormalizer {
    pub fn new(translator: Translator, fetcher: ImageFetcher) -> Self {
        Self {
            translator,
            fetcher,
        }
    }

    /// Build the upstream inputs for `model` from the client request
    pub async fn normalize(
        &self,
        model: &ModelDescriptor,
        request: &GenerationRequest,
    ) -> Result<ModelInputs> {
        let seed = request.effective_seed()?;
        let inputs = strategy_for(model.family)
            .normalize(self, request, seed)
            .await?;
        debug!(model = %model.id, fields = inputs.len(), "Normalized model inputs");
        Ok(inputs)
    }

    async fn prompt(&self, request: &GenerationRequest) -> String {
        let raw = request
            .prompt
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PROMPT);
        self.translator.to_english(raw).await
    }

    async fn negative_prompt(&self, request: &GenerationRequest) -> String {
        let raw = request.negative_prompt.as_deref().unwrap_or_default();
        self.translator.to_english(raw).await
    }
}

#[async_trait]
impl NormalizeStrategy for FastStrategy {
    async fn normalize(
        &self,
        normalizer: &InputNormalizer,
        request: &GenerationRequest,
        _seed: Option<Seed>,
    ) -> Result<ModelInputs> {
        let steps = fast_steps(request.num_steps);
        let prompt = normalizer.prompt(request).await;

        let mut inputs = ModelInputs::new();
        inputs.insert("prompt", json!(prompt));
        inputs.insert("steps", json!(steps));
        Ok(inputs)
    }
}

#[async_trait]
impl NormalizeStrategy for ImageConditionedStrategy {
    async fn normalize(
        &self,
        normalizer: &InputNormalizer,
        request: &GenerationRequest,
        seed: Option<Seed>,
    ) -> Result<ModelInputs> {
        let image_url = request
            .image_url
            .as_deref()
            .filter(|u| !u.is_empty())
            .ok_or_else(|| {
                AppError::InvalidRequest("该模型需要提供 image_url 参数（输入图像 URL）".to_string())
            })?;
        let image = Arc::new(normalizer.fetcher.fetch(image_url, ImageRole::Input).await?.bytes);

        let mask = if self.with_mask {
            let mask_url = request
                .mask_url
                .as_deref()
                .filter(|u| !u.is_empty())
                .ok_or_else(|| {
                    AppError::InvalidRequest(
                        "该模型需要提供 mask_url 参数（遮罩图像 URL）".to_string(),
                    )
                })?;
            Some(Arc::new(
                normalizer.fetcher.fetch(mask_url, ImageRole::Mask).await?.bytes,
            ))
        } else {
            None
        };

        let seed = resolve_seed(seed);
        let prompt = normalizer.prompt(request).await;
        let negative_prompt = normalizer.negative_prompt(request).await;

        let mut inputs = ModelInputs::new();
        inputs.insert("prompt", json!(prompt));
        inputs.insert("negative_prompt", json!(negative_prompt));
        inputs.insert("height", json!(sanitize_dimension(request.height, 512)));
        inputs.insert("width", json!(sanitize_dimension(request.width, 512)));
        inputs.insert(
            "num_steps",
            json!(integer_or(request.num_steps, 20.0).clamp(1.0, 50.0) as u32),
        );
        inputs.insert(
            "strength",
            number(request.strength.unwrap_or(0.8).clamp(0.0, 1.0)),
        );
        inputs.insert(
            "guidance",
            number(request.guidance.unwrap_or(7.5).clamp(0.0, 30.0)),
        );
        inputs.insert("seed", json!(seed));
        inputs.insert_image("image", image);
        if let Some(mask) = mask {
            // Model revisions disagree on the field name
            inputs.insert_image("mask", mask.clone());
            inputs.insert_image("mask_image", mask);
        }
        Ok(inputs)
    }
}

#[async_trait]
impl NormalizeStrategy for TextToImageStrategy {
    async fn normalize(
        &self,
        normalizer: &InputNormalizer,
        request: &GenerationRequest,
        seed: Option<Seed>,
    ) -> Result<ModelInputs> {
        let seed = resolve_seed(seed);
        let prompt = normalizer.prompt(request).await;
        let negative_prompt = normalizer.negative_prompt(request).await;

        let mut inputs = ModelInputs::new();
        inputs.insert("prompt", json!(prompt));
        inputs.insert("negative_prompt", json!(negative_prompt));
        inputs.insert("height", number(truthy_or(request.height, 1024.0)));
        inputs.insert("width", number(truthy_or(request.width, 1024.0)));
        inputs.insert("num_steps", number(truthy_or(request.num_steps, 20.0)));
        inputs.insert("strength", number(truthy_or(request.strength, 0.1)));
        inputs.insert("guidance", number(truthy_or(request.guidance, 7.5)));
        inputs.insert("seed", json!(seed));
        Ok(inputs)
    }
}

/// Step count for the distilled family: default 6, clamped into [4, 8]
pub fn fast_steps(requested: Option<f64>) -> u32 {
    truthy_or(requested, 6.0).clamp(4.0, 8.0).round() as u32
}

/// Clamp into [256, 2048], then round to the nearest multiple of 64
pub fn sanitize_dimension(requested: Option<f64>, default: u32) -> u32 {
    let value = integer_or(requested, f64::from(default)).clamp(256.0, 2048.0);
    ((value / 64.0).round() * 64.0) as u32
}

/// Client seed, or a fresh random one when absent
pub fn resolve_seed(seed: Option<Seed>) -> Seed {
    seed.unwrap_or_else(|| Seed::Numeric(rand::thread_rng().gen_range(0..RANDOM_SEED_RANGE)))
}

/// Seed carried by normalized inputs, if any
pub fn seed_of(inputs: &ModelInputs) -> Option<Seed> {
    match inputs.get("seed")? {
        Value::Number(n) => n.as_u64().map(Seed::Numeric),
        Value::String(s) => Some(Seed::Opaque(s.clone())),
        _ => None,
    }
}

fn truthy_or(value: Option<f64>, default: f64) -> f64 {
    value.filter(|v| *v != 0.0).unwrap_or(default)
}

/// Integer part of the value, with zero treated as absent
fn integer_or(value: Option<f64>, default: f64) -> f64 {
    truthy_or(value.map(f64::trunc), default)
}

/// Whole numbers serialize as JSON integers
fn number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < i64::MAX as f64 {
        json!(value as i64)
    } else {
        json!(value)
    }
}

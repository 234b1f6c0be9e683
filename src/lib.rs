//! Text-to-image gateway
//!
//! Proxies image generation requests to Workers AI models, normalizing the
//! per-model inputs, translating prompts, fanning out multi-image batches and
//! returning PNG or data-URL responses behind an optional password gate.

pub mod api;
pub mod backend;
pub mod catalog;
pub mod config;
pub mod error;
pub mod generation;
pub mod middleware;
pub mod response;

pub use error::{AppError, Result};

use std::sync::Arc;

use backend::InferenceBackend;
use generation::{Batcher, ImageFetcher, InputNormalizer, Translator};
use middleware::AuthGate;

/// Front end page shipped with the binary
pub const DEFAULT_INDEX_HTML: &str = include_str!("../static/index.html");

/// Application state shared across all handlers
pub struct AppState {
    pub settings: Arc<config::Settings>,
    pub auth: AuthGate,
    pub normalizer: InputNormalizer,
    pub batcher: Batcher,
    pub index_html: String,
}

impl AppState {
    /// Wire the pipeline around an inference backend
    pub fn new(settings: config::Settings, backend: Arc<dyn InferenceBackend>) -> Result<Self> {
        let index_html = match &settings.server.index_html {
            Some(path) => std::fs::read_to_string(path)?,
            None => DEFAULT_INDEX_HTML.to_string(),
        };

        let translator = Translator::new(backend.clone(), &settings.translation);
        let fetcher = ImageFetcher::new(&settings.fetch)?;

        Ok(Self {
            auth: AuthGate::new(&settings.auth),
            normalizer: InputNormalizer::new(translator, fetcher),
            batcher: Batcher::new(backend),
            index_html,
            settings: Arc::new(settings),
        })
    }
}

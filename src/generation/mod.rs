//! Generation pipeline - request parsing, normalization, translation, batching

pub mod batcher;
pub mod fetcher;
pub mod normalizer;
pub mod request;
pub mod translate;

pub use batcher::{BatchOutcome, Batcher};
pub use fetcher::{ImageFetcher, ImageRole};
pub use normalizer::InputNormalizer;
pub use request::{GenerationRequest, Seed};
pub use translate::Translator;

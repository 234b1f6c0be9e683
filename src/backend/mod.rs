//! Backend module - inference trait and the Workers AI client

pub mod http_backend;
pub mod traits;

pub use http_backend::WorkersAiBackend;
pub use traits::{InferenceBackend, InferenceOutput, ModelInputs};

//! Configuration loading

pub mod settings;

pub use settings::{
    AuthConfig, FetchConfig, InferenceConfig, LoggingConfig, RateLimitConfig, ServerConfig,
    Settings, TranslationConfig,
};

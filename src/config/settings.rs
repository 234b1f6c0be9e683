//! Application settings and configuration management

use crate::error::{AppError, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Environment variable naming an alternative configuration file
pub const CONFIG_PATH_ENV: &str = "TEXT2IMG_CONFIG";

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub server: ServerConfig,
    pub auth: AuthConfig,
    pub inference: InferenceConfig,
    pub translation: TranslationConfig,
    pub fetch: FetchConfig,
    pub rate_limit: RateLimitConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Serve this file instead of the bundled front end
    #[serde(default)]
    pub index_html: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Password gate configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    /// Accepted passwords; an empty list disables the gate
    #[serde(default)]
    pub passwords: Vec<String>,
    /// When set, auth cookies are HMAC-signed with this secret
    #[serde(default)]
    pub cookie_secret: Option<String>,
    #[serde(default = "default_cookie_max_age")]
    pub cookie_max_age_secs: u64,
}

fn default_cookie_max_age() -> u64 {
    7 * 24 * 3600
}

/// Workers AI REST endpoint configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct InferenceConfig {
    #[serde(default = "default_inference_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_inference_timeout")]
    pub timeout_ms: u64,
}

fn default_inference_base_url() -> String {
    "https://api.cloudflare.com/client/v4".to_string()
}

fn default_inference_timeout() -> u64 {
    120_000
}

/// Prompt translation configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranslationConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_translation_model")]
    pub model: String,
}

fn default_true() -> bool {
    true
}

fn default_translation_model() -> String {
    "@cf/meta/llama-3.1-8b-instruct".to_string()
}

/// Conditioning image download configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FetchConfig {
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: u64,
    #[serde(default = "default_fetch_timeout")]
    pub timeout_ms: u64,
}

fn default_max_image_bytes() -> u64 {
    10 * 1024 * 1024
}

fn default_fetch_timeout() -> u64 {
    30_000
}

/// Rate limiting configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RateLimitConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rps")]
    pub requests_per_second: u32,
    #[serde(default = "default_burst")]
    pub burst_size: u32,
}

fn default_rps() -> u32 {
    5
}

fn default_burst() -> u32 {
    10
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Settings {
    /// Load settings from the default configuration file and environment variables
    pub fn load() -> Result<Self> {
        let path =
            std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "config/default.toml".to_string());
        Self::load_from_path(path)
    }

    /// Load settings from a specific configuration file path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_str().unwrap_or("config/default.toml");

        let config = Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("auth.passwords", Vec::<String>::new())?
            .set_default("auth.cookie_max_age_secs", 604_800)?
            .set_default("inference.base_url", "https://api.cloudflare.com/client/v4")?
            .set_default("inference.account_id", "")?
            .set_default("inference.api_token", "")?
            .set_default("inference.timeout_ms", 120_000)?
            .set_default("translation.enabled", true)?
            .set_default("translation.model", "@cf/meta/llama-3.1-8b-instruct")?
            .set_default("fetch.max_image_bytes", 10 * 1024 * 1024)?
            .set_default("fetch.timeout_ms", 30_000)?
            .set_default("rate_limit.enabled", false)?
            .set_default("rate_limit.requests_per_second", 5)?
            .set_default("rate_limit.burst_size", 10)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .add_source(File::with_name(path).required(false))
            // TEXT2IMG__AUTH__PASSWORDS=a,b
            .add_source(
                Environment::with_prefix("TEXT2IMG")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("auth.passwords")
                    .try_parsing(true),
            )
            .build()?;

        let settings: Settings = config.try_deserialize()?;
        Ok(settings)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(invalid("Server port cannot be 0"));
        }
        if self.inference.timeout_ms == 0 || self.fetch.timeout_ms == 0 {
            return Err(invalid("Timeouts must be greater than 0"));
        }
        if self.fetch.max_image_bytes == 0 {
            return Err(invalid("fetch.max_image_bytes must be greater than 0"));
        }
        if self.rate_limit.enabled
            && (self.rate_limit.requests_per_second == 0 || self.rate_limit.burst_size == 0)
        {
            return Err(invalid("Rate limit must allow at least one request"));
        }
        if self.auth.cookie_secret.as_deref() == Some("") {
            return Err(invalid("auth.cookie_secret cannot be empty"));
        }

        Ok(())
    }
}

fn invalid(message: &str) -> AppError {
    AppError::Config(config::ConfigError::Message(message.to_string()))
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: default_host(),
                port: default_port(),
                index_html: None,
            },
            auth: AuthConfig {
                passwords: vec![],
                cookie_secret: None,
                cookie_max_age_secs: default_cookie_max_age(),
            },
            inference: InferenceConfig {
                base_url: default_inference_base_url(),
                account_id: String::new(),
                api_token: String::new(),
                timeout_ms: default_inference_timeout(),
            },
            translation: TranslationConfig {
                enabled: true,
                model: default_translation_model(),
            },
            fetch: FetchConfig {
                max_image_bytes: default_max_image_bytes(),
                timeout_ms: default_fetch_timeout(),
            },
            rate_limit: RateLimitConfig {
                enabled: false,
                requests_per_second: default_rps(),
                burst_size: default_burst(),
            },
            logging: LoggingConfig {
                level: default_log_level(),
                format: default_log_format(),
            },
        }
    }
}

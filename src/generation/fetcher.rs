//! Download and validation of conditioning images

use reqwest::{header::CONTENT_TYPE, Client};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::FetchConfig;
use crate::error::{AppError, Result};

/// Which conditioning resource is being fetched; used in error messages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageRole {
    Input,
    Mask,
}

impl ImageRole {
    pub fn label(self) -> &'static str {
        match self {
            ImageRole::Input => "输入图像",
            ImageRole::Mask => "遮罩图像",
        }
    }
}

/// A downloaded image that passed validation
#[derive(Debug, Clone)]
pub struct FetchedImage {
    pub bytes: Vec<u8>,
}

/// HTTP client that downloads image URLs with type and size checks
#[derive(Clone)]
pub struct ImageFetcher {
    client: Client,
    max_bytes: u64,
}

fn megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / 1024.0 / 1024.0)
}

impl ImageFetcher {
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            max_bytes: config.max_image_bytes,
        })
    }

    fn too_large(&self, role: ImageRole, size: u64) -> AppError {
        AppError::InvalidRequest(format!(
            "{}体积过大({}MB)，请不超过{}MB",
            role.label(),
            megabytes(size),
            self.max_bytes / 1024 / 1024
        ))
    }

    /// Fetch `url`, rejecting failures, non-image content and oversized bodies
    pub async fn fetch(&self, url: &str, role: ImageRole) -> Result<FetchedImage> {
        debug!(url = %url, role = role.label(), "Fetching conditioning image");

        let mut response = self.client.get(url).send().await.map_err(|e| {
            warn!(url = %url, error = %e, "Conditioning image request failed");
            AppError::InvalidRequest(format!("{}获取失败，{}", role.label(), e))
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(AppError::InvalidRequest(format!(
                "{}获取失败，HTTP {}",
                role.label(),
                status.as_u16()
            )));
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return Err(AppError::InvalidRequest(format!(
                "{}不是图片资源，content-type={}",
                role.label(),
                content_type
            )));
        }

        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(self.too_large(role, length));
            }
        }

        // Content-Length may be missing or wrong, so the cap also applies while reading
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| {
            AppError::InvalidRequest(format!("{}获取失败，{}", role.label(), e))
        })? {
            let size = (bytes.len() + chunk.len()) as u64;
            if size > self.max_bytes {
                warn!(url = %url, size = size, "Conditioning image exceeds size limit");
                return Err(self.too_large(role, size));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(url = %url, size = bytes.len(), content_type = %content_type, "Fetched conditioning image");
        Ok(FetchedImage { bytes })
    }
}

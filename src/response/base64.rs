//! Base64 and data-URI helpers

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::error::{AppError, Result};

/// Encode binary data to base64 string
pub fn encode(data: &[u8]) -> String {
    STANDARD.encode(data)
}

/// Decode base64 string to binary data
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    // Accept data URLs too (e.g. "data:image/png;base64,...")
    let data = match encoded.split_once(',') {
        Some((prefix, rest)) if prefix.starts_with("data:") => rest,
        _ => encoded,
    };

    STANDARD
        .decode(data.trim())
        .map_err(|e| AppError::upstream("Failed to process image data", e.to_string()))
}

/// Wrap already-encoded base64 data in a data URL
pub fn data_url_from_base64(encoded: &str, format: &str) -> String {
    format!("data:image/{};base64,{}", format, encoded)
}

/// Create a data URL from binary image data
pub fn create_data_url(data: &[u8], format: &str) -> String {
    data_url_from_base64(&encode(data), format)
}

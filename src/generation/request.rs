//! Generation request body and lenient field parsing

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{AppError, Result};

/// Body of a generation request.
///
/// Numeric fields accept JSON numbers as well as numeric strings (`"512"`,
/// `"0.75"`); values that do not start with a number are treated as absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerationRequest {
    #[serde(default)]
    pub prompt: Option<String>,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub height: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub width: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub num_steps: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub strength: Option<f64>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub guidance: Option<f64>,
    /// Raw seed; interpreted by [`GenerationRequest::effective_seed`]
    #[serde(default)]
    pub seed: Option<Value>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub mask_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_number")]
    pub num_outputs: Option<f64>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub password: Option<String>,
}

/// Largest numeric seed accepted; offsets for a full batch stay exact
pub const MAX_NUMERIC_SEED: u64 = (1 << 53) - 1;

/// Client supplied seed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Seed {
    /// Offset per batch index
    Numeric(u64),
    /// Forwarded verbatim, never offset
    Opaque(String),
}

impl Seed {
    /// Seed for the `index`-th output of a batch
    pub fn offset(&self, index: usize) -> Seed {
        match self {
            Seed::Numeric(n) => Seed::Numeric(n.saturating_add(index as u64)),
            Seed::Opaque(s) => Seed::Opaque(s.clone()),
        }
    }
}

impl std::fmt::Display for Seed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Seed::Numeric(n) => write!(f, "{}", n),
            Seed::Opaque(s) => f.write_str(s),
        }
    }
}

impl GenerationRequest {
    /// Both `prompt` and `model` must be present
    pub fn has_required_fields(&self) -> bool {
        self.prompt.is_some() && self.model.is_some()
    }

    /// Number of outputs, defaulting to 1 and clamped into [1, 8]
    pub fn output_count(&self) -> usize {
        let n = self.num_outputs.map(|v| v.trunc()).filter(|v| *v != 0.0).unwrap_or(1.0);
        n.clamp(1.0, 8.0) as usize
    }

    /// Seed with falsy values (zero, empty string, `false`) treated as absent.
    ///
    /// Numbers and numeric strings must be whole and within
    /// [0, MAX_NUMERIC_SEED]; any other string is forwarded as is.
    pub fn effective_seed(&self) -> Result<Option<Seed>> {
        let seed = match &self.seed {
            None | Some(Value::Null) | Some(Value::Bool(false)) => return Ok(None),
            Some(Value::Number(n)) => match (n.as_u64(), n.as_f64()) {
                (Some(v), _) => numeric_seed(v as f64, Some(v))?,
                (None, Some(v)) => numeric_seed(v, None)?,
                (None, None) => return Err(invalid_seed()),
            },
            Some(Value::String(s)) => match s.trim().parse::<f64>() {
                Ok(v) if v.is_finite() => numeric_seed(v, s.trim().parse::<u64>().ok())?,
                _ => Seed::Opaque(s.clone()),
            },
            Some(other) => Seed::Opaque(other.to_string()),
        };

        Ok(match seed {
            Seed::Numeric(0) => None,
            Seed::Opaque(s) if s.is_empty() => None,
            seed => Some(seed),
        })
    }
}

fn invalid_seed() -> AppError {
    AppError::InvalidRequest(format!(
        "seed must be a whole number between 0 and {}",
        MAX_NUMERIC_SEED
    ))
}

/// `exact` carries the integer when the input was one, avoiding float rounding
fn numeric_seed(value: f64, exact: Option<u64>) -> Result<Seed> {
    let valid = value.fract() == 0.0 && value >= 0.0 && value <= MAX_NUMERIC_SEED as f64;
    match exact {
        Some(v) if v <= MAX_NUMERIC_SEED => Ok(Seed::Numeric(v)),
        Some(_) => Err(invalid_seed()),
        None if valid => Ok(Seed::Numeric(value as u64)),
        None => Err(invalid_seed()),
    }
}

/// Parse the leading decimal number of a string, like JavaScript's `parseFloat`
pub fn parse_leading_number(text: &str) -> Option<f64> {
    let text = text.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;
    if end < bytes.len() && (bytes[end] == b'-' || bytes[end] == b'+') {
        end += 1;
    }
    let digits_start = end;
    while end < bytes.len() && bytes[end].is_ascii_digit() {
        end += 1;
    }
    if end < bytes.len() && bytes[end] == b'.' {
        end += 1;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
    }
    let number = &text[..end];
    if number.len() == digits_start || number[digits_start..] == *"." {
        return None;
    }
    number.parse().ok()
}

fn number_from_value(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_leading_number(s),
        _ => None,
    }
}

fn lenient_number<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(number_from_value)
        .filter(|v| v.is_finite()))
}

/// Non-string values are treated as absent
fn lenient_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        _ => None,
    })
}

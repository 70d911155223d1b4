//! Chain identifier normalization.

use crate::{NormalizeError, NormalizeResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical chain identifier.
pub type ChainId = u64;

/// MetaMask Mobile 0.2.13 reports chain ids starting with a capital letter O.
const MOBILE_TYPO_PREFIX: &str = "Ox";

/// A chain identifier exactly as a wallet reported it.
///
/// Deserializes from any JSON number or string, so values read straight out
/// of an RPC response can be normalized without a lossy intermediate step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawChainId {
    Integer(u64),
    Float(f64),
    Text(String),
}

impl fmt::Display for RawChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawChainId::Integer(value) => write!(f, "{}", value),
            RawChainId::Float(value) => write!(f, "{}", value),
            RawChainId::Text(value) => f.write_str(value),
        }
    }
}

impl From<u64> for RawChainId {
    fn from(value: u64) -> Self {
        RawChainId::Integer(value)
    }
}

impl From<u32> for RawChainId {
    fn from(value: u32) -> Self {
        RawChainId::Integer(u64::from(value))
    }
}

impl From<f64> for RawChainId {
    fn from(value: f64) -> Self {
        RawChainId::Float(value)
    }
}

impl From<&str> for RawChainId {
    fn from(value: &str) -> Self {
        RawChainId::Text(value.to_string())
    }
}

impl From<String> for RawChainId {
    fn from(value: String) -> Self {
        RawChainId::Text(value)
    }
}

/// Canonicalize a chain identifier.
///
/// Strings are trimmed, the mobile `Ox` typo is rewritten to `0x`, then the
/// remainder is parsed as hex when prefixed with `0x`/`0X` and as decimal
/// otherwise. The whole remainder must be digits; trailing garbage, signs
/// and empty digit runs are rejected. Floats must be finite, integral and
/// non-negative.
pub fn normalize_chain_id(value: impl Into<RawChainId>) -> NormalizeResult<ChainId> {
    match value.into() {
        RawChainId::Integer(value) => Ok(value),
        RawChainId::Float(value) => normalize_float(value),
        RawChainId::Text(value) => normalize_text(&value),
    }
}

fn normalize_float(value: f64) -> NormalizeResult<ChainId> {
    if value.is_finite() && value.fract() == 0.0 && value >= 0.0 && value <= u64::MAX as f64 {
        Ok(value as u64)
    } else {
        Err(NormalizeError::InvalidChainId(value.to_string()))
    }
}

fn normalize_text(raw: &str) -> NormalizeResult<ChainId> {
    let invalid = || NormalizeError::InvalidChainId(raw.to_string());

    let trimmed = raw.trim();
    let trimmed = match trimmed.strip_prefix(MOBILE_TYPO_PREFIX) {
        Some(rest) => format!("0x{}", rest),
        None => trimmed.to_string(),
    };

    let (digits, radix) = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => (hex, 16),
        None => (trimmed.as_str(), 10),
    };

    let well_formed = !digits.is_empty()
        && digits.chars().all(|c| c.is_digit(radix));
    if !well_formed {
        return Err(invalid());
    }

    u64::from_str_radix(digits, radix).map_err(|_| invalid())
}

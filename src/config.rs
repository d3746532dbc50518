//! Filter limits
//!
//! The storage layer decides how large a filter account may grow. These
//! limits are checked on every init.

use crate::{BloomError, Result};
use serde::{Deserialize, Serialize};

/// Maximum filter name length in bytes
pub const MAX_NAME_LEN: usize = 32;

/// Maximum bit-array size
pub const MAX_FILTER_BITS: u32 = 10_000;

/// Maximum number of hash slots
pub const MAX_HASHES: u8 = u8::MAX;

/// Upper bounds applied when a filter is created
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterLimits {
    pub max_name_len: usize,
    pub max_filter_bits: u32,
    pub max_hashes: u8,
}

impl Default for FilterLimits {
    fn default() -> Self {
        Self {
            max_name_len: MAX_NAME_LEN,
            max_filter_bits: MAX_FILTER_BITS,
            max_hashes: MAX_HASHES,
        }
    }
}

impl FilterLimits {
    pub fn new(max_name_len: usize, max_filter_bits: u32, max_hashes: u8) -> Result<Self> {
        let limits = Self {
            max_name_len,
            max_filter_bits,
            max_hashes,
        };
        limits.validate()?;
        Ok(limits)
    }

    /// Parse limits from JSON. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let limits: FilterLimits = serde_json::from_str(json)
            .map_err(|e| BloomError::InvalidParameters(format!("bad limits config: {}", e)))?;
        limits.validate()?;
        Ok(limits)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_name_len == 0 {
            return Err(BloomError::InvalidParameters(
                "max_name_len must be > 0".to_string(),
            ));
        }
        if self.max_filter_bits == 0 {
            return Err(BloomError::InvalidParameters(
                "max_filter_bits must be > 0".to_string(),
            ));
        }
        if self.max_hashes == 0 {
            return Err(BloomError::InvalidParameters(
                "max_hashes must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

//! # State Configuration
//!
//! Limits applied when state entries are decoded from untrusted bytes or
//! grown by mutation.

use shared_types::DecodeLimits;

/// Configuration for the entry model.
#[derive(Clone, Debug)]
pub struct StateConfig {
    /// Maximum element count of any packed array or map.
    pub max_collection_len: usize,
    /// Maximum byte length of any packed string.
    pub max_string_len: usize,
    /// Maximum number of encumbrance fragments held for one asset.
    pub max_encumbrances_per_asset: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            max_collection_len: 100_000,
            max_string_len: 1024 * 1024,
            max_encumbrances_per_asset: 10_000,
        }
    }
}

impl StateConfig {
    pub fn decode_limits(&self) -> DecodeLimits {
        DecodeLimits {
            max_collection_len: self.max_collection_len,
            max_string_len: self.max_string_len,
        }
    }
}

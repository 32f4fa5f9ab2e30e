//! # Shared Identifiers
//!
//! Aliases and key helpers used by every state entry.
//!
//! ## Asset identifiers
//!
//! A full asset id is always `namespace + "|" + class_id`. The separator and
//! the ordering are part of the persisted layout and must never change.

use serde::{Deserialize, Serialize};

/// Block height. Negative values mean "never set".
pub type BlockHeight = i64;

/// Seconds since the UNIX epoch (UTC).
pub type Timestamp = i64;

/// Update height of an entry that has never been touched by a block.
pub const UNSET_HEIGHT: BlockHeight = -1;

/// Separator between namespace and class id in a full asset id.
pub const ASSET_ID_SEPARATOR: char = '|';

/// Compose the canonical full asset id for `namespace` and `class_id`.
pub fn full_asset_id(namespace: &str, class_id: &str) -> String {
    let mut id = String::with_capacity(namespace.len() + class_id.len() + 1);
    id.push_str(namespace);
    id.push(ASSET_ID_SEPARATOR);
    id.push_str(class_id);
    id
}

/// Split a full asset id at its first separator.
pub fn split_asset_id(asset_id: &str) -> Option<(&str, &str)> {
    asset_id.split_once(ASSET_ID_SEPARATOR)
}

/// Case-insensitive comparison used for addresses and references.
pub fn eq_ignore_case(a: &str, b: &str) -> bool {
    if a.is_ascii() && b.is_ascii() {
        return a.eq_ignore_ascii_case(b);
    }
    a.to_lowercase() == b.to_lowercase()
}

/// Numeric transaction type identifier.
///
/// Only the id is persisted; the meaning of each id belongs to the
/// transaction-processing layer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxType(pub i32);

impl TxType {
    pub fn id(self) -> i32 {
        self.0
    }
}

impl From<i32> for TxType {
    fn from(id: i32) -> Self {
        TxType(id)
    }
}

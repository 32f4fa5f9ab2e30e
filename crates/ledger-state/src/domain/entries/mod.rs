//! # State Entries
//!
//! Every entry kind held in the state Merkle trees, apart from the
//! encumbrance ledger which lives in its own module.
//!
//! Each type implements [`StateEntry`](crate::ports::StateEntry) for its key
//! and update height, [`EntryDecoder`](crate::ports::EntryDecoder) for the
//! legacy array form and [`Packable`](crate::ports::Packable) for the
//! versioned packed form.

pub mod address;
pub mod contract;
pub mod locked_asset;
pub mod namespace;
pub mod poa;
pub mod sign_node;
pub mod xchain;

pub use address::{AddressEntry, Nonces, AP_DEFAULT_AUTHORISE_BY_ADDRESS, AP_TX_LIST};
pub use contract::ContractEntry;
pub use locked_asset::{LockType, LockedAsset};
pub use namespace::{NamespaceAsset, NamespaceEntry};
pub use poa::{PoaDetail, PoaEntry, PoaHeader, PoaItem};
pub use sign_node::SignNodeEntry;
pub use xchain::XChainDetails;

use shared_types::{BlockHeight, Value, UNSET_HEIGHT};

pub(crate) fn unset_height() -> BlockHeight {
    UNSET_HEIGHT
}

/// Legacy arrays never carry a negative index.
pub(crate) fn legacy_index(index: i64) -> Value {
    Value::from(index.max(0))
}

/// Append the update height to a legacy array once it has been set.
pub(crate) fn push_update_height(items: &mut Vec<Value>, height: BlockHeight) {
    if height >= 0 {
        items.push(Value::from(height));
    }
}

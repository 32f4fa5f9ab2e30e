//! # Encumbrance Ledger
//!
//! Conditional holds against an address's asset balances.
//!
//! - [`EncumbranceDetail`]: a party's validity window.
//! - [`EncumbranceEntry`]: one fragment of a reference.
//! - [`AssetEncumbrances`]: ordered fragments for one asset, with the
//!   priority and consolidation engine.
//! - [`AddressEncumbrances`]: per-address map of asset collections, the
//!   persisted unit.

pub mod address;
pub mod asset;
pub mod detail;
pub mod entry;

pub use address::AddressEncumbrances;
pub use asset::AssetEncumbrances;
pub use detail::EncumbranceDetail;
pub use entry::{EncumbranceEntry, DEFAULT_PRIORITY, HIGH_PRIORITY};

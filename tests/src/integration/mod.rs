//! Cross-crate flows over the public `ledger-state` API.

pub mod codec_determinism;
pub mod encumbrance_flows;
pub mod store_flows;

//! # Shared Types Crate
//!
//! Primitives shared by every state entry of the ledger.
//!
//! ## Contents
//!
//! - [`Balance`]: arbitrary precision amounts with a single canonical encoding.
//! - [`codec`]: the MessagePack [`Packer`]/[`Unpacker`] pair, the legacy
//!   array accessor and the version-tag helper.
//! - [`CodecError`]: the failure type of every decode path.
//! - Identifiers: block heights, timestamps, full asset ids, tx type ids.
//!
//! ## Design Principles
//!
//! - **Deterministic bytes**: identical logical values always pack to
//!   identical bytes, because state hashes are computed over them.
//! - **Fail loudly**: an unknown version or malformed field is an error, never
//!   a best-effort interpretation.

pub mod balance;
pub mod codec;
pub mod entities;
pub mod errors;

pub use balance::{Balance, BIGINT_EXT_TYPE};
pub use codec::{DecodeLimits, LegacyArray, Packable, Packer, Unpacker};
pub use entities::*;
pub use errors::*;

/// Re-exported so dependants build legacy values with the same type.
pub use rmpv::Value;

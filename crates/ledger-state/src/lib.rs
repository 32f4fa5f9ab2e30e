//! # ledger-state
//!
//! State entries of the permissioned ledger and their canonical encodings.
//!
//! ## Role in System
//!
//! - **Encumbrance Ledger**: conditional holds against address balances, with
//!   priority ordering, consolidation and partial consumption
//! - **Entry Model**: addresses, namespaces, contracts, powers of attorney,
//!   sign nodes, locked assets and cross-chain details
//! - **Canonical Codec**: every entry packs to versioned, deterministic bytes
//!   so that nodes agree on state hashes
//!
//! ## Entry Lifecycle
//!
//! ```text
//! [packed bytes] ──unpack──→ [typed entry] ──mutate──→ [typed entry]
//!                                                           │
//!        [EntryStore] ←──commit (pack + leaf hash)──────────┘
//! ```
//!
//! ## Boundaries
//!
//! - Transaction validation and contract execution call into this crate; they
//!   are not part of it
//! - Storage is behind the [`EntryStore`] port; [`InMemoryEntryStore`] is the
//!   bundled adapter

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::*;
pub use domain::*;
pub use ports::*;

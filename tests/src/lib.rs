//! # Ledger State Test Suite
//!
//! Unified test crate for the ledger state workspace.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── benches/
//! │   └── codec_benchmarks.rs   # Pack/unpack throughput
//! └── src/integration/
//!     ├── encumbrance_flows.rs  # Multi-step encumbrance scenarios
//!     ├── codec_determinism.rs  # Property tests over the canonical codec
//!     └── store_flows.rs        # Entries through the hashed entry store
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ledger-tests
//!
//! # By category
//! cargo test -p ledger-tests integration::encumbrance_flows
//! cargo test -p ledger-tests integration::codec_determinism
//!
//! # Benchmarks
//! cargo bench -p ledger-tests
//! ```
//!
//! Set `RUST_LOG=debug` to see the store and encumbrance logs.

pub mod integration;

/// Install a test subscriber honouring `RUST_LOG`. Safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

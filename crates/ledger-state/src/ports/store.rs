use crate::domain::StateError;
use crate::ports::StateEntry;

/// 32-byte SHA-256 digest.
pub type Hash = [u8; 32];

/// Persistence abstraction for packed entries of one kind.
pub trait EntryStore<E: StateEntry>: Send + Sync {
    /// Pack `entry` and store it under its key. Returns the leaf hash.
    fn commit(&self, entry: &E) -> Result<Hash, StateError>;

    /// Load and unpack the entry stored under `key`.
    fn get(&self, key: &str) -> Result<Option<E>, StateError>;

    /// Remove the entry under `key`, returning whether it existed.
    fn remove(&self, key: &str) -> Result<bool, StateError>;

    /// Hash over every stored `(key, leaf hash)` pair in key order.
    fn root_hash(&self) -> Result<Hash, StateError>;
}

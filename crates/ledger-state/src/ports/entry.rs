use shared_types::{BlockHeight, CodecError, Value};

pub use shared_types::codec::Packable;

/// Contract shared by every persisted state entry.
///
/// Entries are plain values: `copy` is a deep clone, so a snapshot handed to
/// one block context is never affected by mutations made on another copy.
pub trait StateEntry: Clone + Packable {
    /// Merkle-tree key of this entry.
    fn key(&self) -> String;

    /// Height of the last block that changed this entry, -1 if never set.
    fn block_update_height(&self) -> BlockHeight;

    /// Record a change at `height`. The stored height never decreases.
    fn set_block_update_height(&mut self, height: BlockHeight);

    /// Legacy array form, `[index, key, payload, ...]`.
    fn encode(&self, index: i64) -> Value;

    fn copy(&self) -> Self {
        self.clone()
    }
}

/// Builds a typed entry from its legacy array form.
pub trait EntryDecoder: Sized {
    fn decode(value: &Value) -> Result<Self, CodecError>;
}

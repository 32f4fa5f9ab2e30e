use crate::domain::{StateConfig, StateError};
use crate::ports::{EntryStore, Hash, StateEntry};
use sha2::{Digest, Sha256};
use shared_types::DecodeLimits;
use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::RwLock;
use tracing::debug;

/// In-memory implementation of EntryStore for testing
///
/// Holds each entry's packed bytes with the SHA-256 leaf hash of those bytes.
pub struct InMemoryEntryStore<E> {
    entries: RwLock<BTreeMap<String, (Vec<u8>, Hash)>>,
    limits: DecodeLimits,
    _entry: PhantomData<fn() -> E>,
}

impl<E: StateEntry> InMemoryEntryStore<E> {
    pub fn new() -> Self {
        Self::with_config(&StateConfig::default())
    }

    pub fn with_config(config: &StateConfig) -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
            limits: config.decode_limits(),
            _entry: PhantomData,
        }
    }

    pub fn len(&self) -> Result<usize, StateError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StateError::LockPoisoned)?;
        Ok(entries.len())
    }

    pub fn is_empty(&self) -> Result<bool, StateError> {
        Ok(self.len()? == 0)
    }

    /// Packed bytes stored under `key`.
    pub fn raw(&self, key: &str) -> Result<Option<Vec<u8>>, StateError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StateError::LockPoisoned)?;
        Ok(entries.get(key).map(|(bytes, _)| bytes.clone()))
    }

    /// Like [`EntryStore::get`] but a missing key is an error.
    pub fn require(&self, key: &str) -> Result<E, StateError> {
        self.get(key)?.ok_or_else(|| StateError::EntryNotFound {
            key: key.to_string(),
        })
    }
}

impl<E: StateEntry> Default for InMemoryEntryStore<E> {
    fn default() -> Self {
        Self::new()
    }
}

fn leaf_hash(bytes: &[u8]) -> Hash {
    Sha256::digest(bytes).into()
}

impl<E: StateEntry> EntryStore<E> for InMemoryEntryStore<E> {
    fn commit(&self, entry: &E) -> Result<Hash, StateError> {
        let key = entry.key();
        let bytes = entry.to_packed_bytes()?;
        let leaf = leaf_hash(&bytes);
        debug!(
            entry = E::ENTRY_NAME,
            key = %key,
            leaf = %hex::encode(&leaf[..8]),
            "Committed entry"
        );
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StateError::LockPoisoned)?;
        entries.insert(key, (bytes, leaf));
        Ok(leaf)
    }

    fn get(&self, key: &str) -> Result<Option<E>, StateError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StateError::LockPoisoned)?;
        match entries.get(key) {
            Some((bytes, _)) => Ok(Some(E::from_packed_bytes_with_limits(bytes, self.limits)?)),
            None => Ok(None),
        }
    }

    fn remove(&self, key: &str) -> Result<bool, StateError> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| StateError::LockPoisoned)?;
        Ok(entries.remove(key).is_some())
    }

    fn root_hash(&self) -> Result<Hash, StateError> {
        let entries = self
            .entries
            .read()
            .map_err(|_| StateError::LockPoisoned)?;
        let mut hasher = Sha256::new();
        for (key, (_, leaf)) in entries.iter() {
            hasher.update((key.len() as u64).to_be_bytes());
            hasher.update(key.as_bytes());
            hasher.update(leaf);
        }
        Ok(hasher.finalize().into())
    }
}

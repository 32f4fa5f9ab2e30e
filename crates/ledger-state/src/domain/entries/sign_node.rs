use super::{push_update_height, unset_height};
use crate::ports::{EntryDecoder, Packable, StateEntry};
use serde::{Deserialize, Serialize};
use shared_types::codec::{read_version, LegacyArray, Packer, Unpacker};
use shared_types::{Balance, BlockHeight, CodecError, Value, UNSET_HEIGHT};

const ENTRY: &str = "SignNodeEntry";
const VERSION: u8 = 1;
const CORE_FIELDS: usize = 6;

/// A bonded signing node, keyed by its hex public key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignNodeEntry {
    #[serde(rename = "publicKey")]
    hex_public_key: String,
    return_address: String,
    balance: Balance,
    nonce: i64,
    #[serde(skip)]
    reserved: (i32, i32),
    #[serde(default = "unset_height")]
    update_height: BlockHeight,
}

impl SignNodeEntry {
    pub fn new(
        hex_public_key: impl Into<String>,
        return_address: impl Into<String>,
        balance: Balance,
        nonce: i64,
    ) -> Self {
        Self {
            hex_public_key: hex_public_key.into(),
            return_address: return_address.into(),
            balance,
            nonce,
            reserved: (0, 0),
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn hex_public_key(&self) -> &str {
        &self.hex_public_key
    }

    pub fn return_address(&self) -> &str {
        &self.return_address
    }

    pub fn set_return_address(&mut self, address: impl Into<String>) {
        self.return_address = address.into();
    }

    pub fn balance(&self) -> &Balance {
        &self.balance
    }

    pub fn set_balance(&mut self, balance: Balance) {
        self.balance = balance;
    }

    pub fn nonce(&self) -> i64 {
        self.nonce
    }

    pub fn increment_nonce(&mut self) {
        self.nonce += 1;
    }

    /// Add `amount` to the bond. Non-positive amounts are ignored.
    pub fn increment_balance(&mut self, amount: &Balance) {
        if amount.is_positive() {
            self.balance += amount;
        }
    }

    /// Remove up to `amount` from the bond, never going below zero.
    /// Non-positive amounts are ignored.
    pub fn decrement_balance(&mut self, amount: &Balance) {
        if amount.is_positive() {
            let taken = std::cmp::min(&self.balance, amount).clone();
            self.balance -= &taken;
        }
    }
}

impl StateEntry for SignNodeEntry {
    fn key(&self) -> String {
        self.hex_public_key.clone()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    fn encode(&self, index: i64) -> Value {
        let core = Value::Array(vec![
            Value::from(self.hex_public_key.as_str()),
            Value::from(self.return_address.as_str()),
            self.balance.to_value(),
            Value::from(self.nonce),
            Value::from(self.reserved.0),
            Value::from(self.reserved.1),
        ]);
        let mut payload = vec![core, Value::Nil];
        push_update_height(&mut payload, self.update_height);
        Value::Array(vec![
            Value::from(index),
            Value::from(self.hex_public_key.as_str()),
            Value::Array(payload),
        ])
    }
}

impl EntryDecoder for SignNodeEntry {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        let payload = array.array(2)?;
        let core = payload.array(0)?;
        if core.len() < CORE_FIELDS {
            return Err(CodecError::MissingField {
                entry: ENTRY,
                index: core.len(),
            });
        }

        let mut entry = SignNodeEntry::new(
            array.string(1)?,
            core.string(1)?,
            core.balance(2)?,
            core.i64(3)?,
        );
        entry.reserved = (core.i32(4)?, core.i32(5)?);
        if let Some(height) = payload.opt_i64(2)? {
            entry.update_height = height.max(UNSET_HEIGHT);
        }
        Ok(entry)
    }
}

impl Packable for SignNodeEntry {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_str(&self.hex_public_key)?;
        packer.pack_str(&self.return_address)?;
        self.balance.pack(packer)?;
        packer.pack_i64(self.nonce)?;
        packer.pack_i32(self.reserved.0)?;
        packer.pack_i32(self.reserved.1)?;
        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let version = read_version(unpacker, ENTRY, 0..=1)?;
        let key = unpacker.unpack_string()?;
        let return_address = unpacker.unpack_string()?;
        let balance = Balance::unpack(unpacker)?;
        let nonce = unpacker.unpack_i64()?;
        let mut entry = SignNodeEntry::new(key, return_address, balance, nonce);
        entry.reserved = (unpacker.unpack_i32()?, unpacker.unpack_i32()?);
        if version >= 1 {
            entry.update_height = unpacker.unpack_i64()?;
        }
        Ok(entry)
    }
}

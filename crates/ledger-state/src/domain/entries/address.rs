use super::{legacy_index, unset_height};
use crate::ports::{EntryDecoder, Packable, StateEntry};
use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use shared_types::codec::{map_value, read_version, value_i64, value_str, LegacyArray, Packer, Unpacker};
use shared_types::{Balance, BlockHeight, CodecError, Timestamp, TxType, Value, UNSET_HEIGHT};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

const ENTRY: &str = "AddressEntry";
const VERSION: u8 = 1;

/// Permission bit required before any per-address transaction list applies.
pub const AP_TX_LIST: u64 = 0x10_0000;

/// System default permissions granted to every address.
pub const AP_DEFAULT_AUTHORISE_BY_ADDRESS: u64 = 0;

const FLAG_METADATA: i32 = 1;
const FLAG_BALANCES: i32 = 1 << 1;
const FLAG_NONCE: i32 = 1 << 2;
const FLAG_AUTHORISED_TX: i32 = 1 << 3;
const FLAG_UPDATE_TIME: i32 = 1 << 4;

/// Transaction sequence numbers of one address.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nonces {
    pub nonce: i64,
    pub high_priority: i64,
    pub low_priority: i64,
}

/// Balances, nonces and permissions held by one address.
#[skip_serializing_none]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressEntry {
    address: String,
    #[serde(rename = "balance")]
    class_balance: Option<BTreeMap<String, Balance>>,
    nonces: Option<Nonces>,
    #[serde(default)]
    address_permissions: u64,
    authorised_tx: Option<BTreeSet<TxType>>,
    metadata: Option<String>,
    update_time: Option<Timestamp>,
    #[serde(default = "unset_height")]
    update_height: BlockHeight,
}

impl AddressEntry {
    /// A bare address: no balances, nonces or permissions.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            class_balance: None,
            nonces: None,
            address_permissions: 0,
            authorised_tx: None,
            metadata: None,
            update_time: None,
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn with_nonces(address: impl Into<String>, nonce: i64, high: i64, low: i64) -> Self {
        let mut entry = Self::new(address);
        entry.nonces = Some(Nonces {
            nonce,
            high_priority: high,
            low_priority: low,
        });
        entry
    }

    /// Fully established address: zero nonces and an empty balance map.
    pub fn established(address: impl Into<String>) -> Self {
        let mut entry = Self::with_nonces(address, 0, 0, 0);
        entry.class_balance = Some(BTreeMap::new());
        entry
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn class_balance(&self) -> Option<&BTreeMap<String, Balance>> {
        self.class_balance.as_ref()
    }

    /// Balance of `full_asset_id`, zero if not held.
    pub fn asset_balance(&self, full_asset_id: &str) -> Balance {
        self.class_balance
            .as_ref()
            .and_then(|m| m.get(full_asset_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Set the balance of `full_asset_id`. A zero balance removes the asset.
    pub fn set_asset_balance(&mut self, full_asset_id: &str, balance: Balance) {
        let balances = self.class_balance.get_or_insert_with(BTreeMap::new);
        if balance.is_zero() {
            balances.remove(full_asset_id);
        } else {
            balances.insert(full_asset_id.to_string(), balance);
        }
    }

    pub fn nonces(&self) -> Option<Nonces> {
        self.nonces
    }

    pub fn is_nonce_unset(&self) -> bool {
        self.nonces.is_none()
    }

    pub fn nonce(&self) -> i64 {
        self.nonces.map_or(0, |n| n.nonce)
    }

    pub fn high_priority_nonce(&self) -> i64 {
        self.nonces.map_or(0, |n| n.high_priority)
    }

    pub fn low_priority_nonce(&self) -> i64 {
        self.nonces.map_or(0, |n| n.low_priority)
    }

    // Nonce setters never move a nonce backwards. Any of them establishes
    // the nonce triple.

    pub fn set_nonce(&mut self, nonce: i64) {
        let n = self.nonces.get_or_insert_with(Nonces::default);
        n.nonce = n.nonce.max(nonce);
    }

    pub fn set_high_priority_nonce(&mut self, nonce: i64) {
        let n = self.nonces.get_or_insert_with(Nonces::default);
        n.high_priority = n.high_priority.max(nonce);
    }

    pub fn set_low_priority_nonce(&mut self, nonce: i64) {
        let n = self.nonces.get_or_insert_with(Nonces::default);
        n.low_priority = n.low_priority.max(nonce);
    }

    /// Permission bitmap including the system default permissions.
    pub fn address_permissions(&self) -> u64 {
        self.address_permissions | AP_DEFAULT_AUTHORISE_BY_ADDRESS
    }

    pub fn set_address_permissions(&mut self, permissions: u64) {
        self.address_permissions = permissions;
    }

    pub fn authorised_tx(&self) -> Option<&BTreeSet<TxType>> {
        self.authorised_tx.as_ref()
    }

    pub fn set_authorised_tx(&mut self, authorised: Option<BTreeSet<TxType>>) {
        self.authorised_tx = authorised;
    }

    /// True if the address holds [`AP_TX_LIST`] and `tx` is in its list.
    pub fn can_use_tx(&self, tx: TxType) -> bool {
        self.address_permissions & AP_TX_LIST != 0
            && self
                .authorised_tx
                .as_ref()
                .is_some_and(|set| set.contains(&tx))
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    pub fn set_metadata(&mut self, metadata: Option<String>) {
        self.metadata = metadata;
    }

    pub fn update_time(&self) -> Option<Timestamp> {
        self.update_time
    }

    /// Advance the update time. `None` leaves the current value in place.
    pub fn set_update_time(&mut self, time: Option<Timestamp>) {
        self.update_time = match (self.update_time, time) {
            (Some(current), Some(new)) => Some(current.max(new)),
            (current, new) => current.or(new),
        };
    }

    fn needs_long_form(&self) -> bool {
        self.authorised_tx.is_some()
            || self.metadata.is_some()
            || self.address_permissions != 0
            || self.update_time.is_some()
            || self.update_height >= 0
    }

    fn flags(&self) -> i32 {
        let mut flag = 0;
        if self.metadata.is_some() {
            flag |= FLAG_METADATA;
        }
        if self.class_balance.is_some() {
            flag |= FLAG_BALANCES;
        }
        if self.nonces.is_some() {
            flag |= FLAG_NONCE;
        }
        if self.authorised_tx.is_some() {
            flag |= FLAG_AUTHORISED_TX;
        }
        if self.update_time.is_some() {
            flag |= FLAG_UPDATE_TIME;
        }
        flag
    }
}

impl StateEntry for AddressEntry {
    fn key(&self) -> String {
        self.address.clone()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    /// Short form `[index, address, [balances, nonces]]`. Once any of the
    /// permission, metadata or update fields is set the payload carries all
    /// seven slots.
    fn encode(&self, index: i64) -> Value {
        let balances = match &self.class_balance {
            Some(map) => map_value(map.iter().map(|(k, v)| (k.clone(), v.to_value()))),
            None => Value::Nil,
        };
        let nonces = match self.nonces {
            Some(n) => Value::Array(vec![
                Value::from(n.nonce),
                Value::from(n.high_priority),
                Value::from(n.low_priority),
            ]),
            None => Value::Nil,
        };

        let mut payload = vec![balances, nonces];
        if self.needs_long_form() {
            let authorised = match &self.authorised_tx {
                Some(set) => Value::Array(set.iter().map(|tx| Value::from(tx.id())).collect()),
                None => Value::Nil,
            };
            payload.extend([
                Value::from(self.address_permissions as i64),
                authorised,
                self.metadata.as_deref().map(Value::from).unwrap_or(Value::Nil),
                self.update_time.map(Value::from).unwrap_or(Value::Nil),
                Value::from(self.update_height),
            ]);
        }

        Value::Array(vec![
            legacy_index(index),
            Value::from(self.address.as_str()),
            Value::Array(payload),
        ])
    }
}

impl EntryDecoder for AddressEntry {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        let address = array.string(1)?;
        let data = array.array(2)?;

        let mut entry = match data.opt_array(1)? {
            Some(n) => AddressEntry::with_nonces(address, n.i64(0)?, n.i64(1)?, n.i64(2)?),
            None => AddressEntry::new(address),
        };

        if let Some(pairs) = data.opt_map(0)? {
            let mut balances = BTreeMap::new();
            for (asset_id, amount) in pairs {
                balances.insert(value_str(asset_id)?.to_string(), Balance::from_value(amount)?);
            }
            entry.class_balance = Some(balances);
        }

        if data.len() > 6 {
            entry.address_permissions = data.opt_i64(2)?.unwrap_or(0) as u64;
            if let Some(txs) = data.opt_array(3)? {
                let mut ids = BTreeSet::new();
                for item in txs.items() {
                    let id = value_i64(item)?;
                    match i32::try_from(id) {
                        Ok(id) => {
                            ids.insert(TxType(id));
                        }
                        Err(_) => warn!(
                            entry = ENTRY,
                            address = %entry.address,
                            id,
                            "Dropping unknown tx type"
                        ),
                    }
                }
                entry.authorised_tx = Some(ids);
            }
            entry.metadata = data.opt_string(4)?;
            entry.update_time = data.opt_i64(5)?;
            entry.update_height = data.opt_i64(6)?.unwrap_or(UNSET_HEIGHT);
        }

        Ok(entry)
    }
}

impl Packable for AddressEntry {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_i32(self.flags())?;
        packer.pack_str(&self.address)?;
        if let Some(metadata) = &self.metadata {
            packer.pack_str(metadata)?;
        }
        // Permissions travel as their signed 64-bit pattern.
        packer.pack_i64(self.address_permissions as i64)?;

        if let Some(balances) = &self.class_balance {
            packer.pack_map_len(balances.len())?;
            for (asset_id, amount) in balances {
                packer.pack_str(asset_id)?;
                amount.pack(packer)?;
            }
        }

        if let Some(n) = self.nonces {
            packer.pack_i64(n.nonce)?;
            packer.pack_i64(n.low_priority)?;
            packer.pack_i64(n.high_priority)?;
        }

        if let Some(txs) = &self.authorised_tx {
            packer.pack_array_len(txs.len())?;
            for tx in txs {
                packer.pack_i32(tx.id())?;
            }
        }

        if let Some(time) = self.update_time {
            packer.pack_i64(time)?;
        }

        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let version = read_version(unpacker, ENTRY, 0..=1)?;
        let flag = unpacker.unpack_i32()?;

        let mut entry = AddressEntry::new(unpacker.unpack_string()?);
        if flag & FLAG_METADATA != 0 {
            entry.metadata = Some(unpacker.unpack_string()?);
        }
        entry.address_permissions = unpacker.unpack_i64()? as u64;

        if flag & FLAG_BALANCES != 0 {
            let len = unpacker.unpack_map_len()?;
            let mut balances = BTreeMap::new();
            for _ in 0..len {
                let asset_id = unpacker.unpack_string()?;
                balances.insert(asset_id, Balance::unpack(unpacker)?);
            }
            entry.class_balance = Some(balances);
        }

        if flag & FLAG_NONCE != 0 {
            let nonce = unpacker.unpack_i64()?;
            let low_priority = unpacker.unpack_i64()?;
            let high_priority = unpacker.unpack_i64()?;
            entry.nonces = Some(Nonces {
                nonce,
                high_priority,
                low_priority,
            });
        }

        if flag & FLAG_AUTHORISED_TX != 0 {
            let len = unpacker.unpack_array_len()?;
            let mut txs = BTreeSet::new();
            for _ in 0..len {
                txs.insert(TxType(unpacker.unpack_i32()?));
            }
            entry.authorised_tx = Some(txs);
        }

        if flag & FLAG_UPDATE_TIME != 0 {
            entry.update_time = Some(unpacker.unpack_i64()?);
        }

        if version > 0 {
            entry.update_height = unpacker.unpack_i64()?;
        }
        Ok(entry)
    }
}

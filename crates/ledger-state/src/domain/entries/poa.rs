use super::{push_update_height, unset_height};
use crate::ports::{EntryDecoder, Packable, StateEntry};
use serde::{Deserialize, Serialize};
use shared_types::codec::{read_version, value_str, LegacyArray, Packer, Unpacker};
use shared_types::{Balance, BlockHeight, CodecError, Timestamp, TxType, Value, UNSET_HEIGHT};
use std::collections::{BTreeMap, BTreeSet};

const ENTRY: &str = "PoaEntry";
const VERSION: u8 = 0;

/// Summary of one power of attorney, held on the issuing address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoaHeader {
    pub reference: String,
    pub hash: String,
    pub start_date: Timestamp,
    pub end_date: Timestamp,
}

impl PoaHeader {
    fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::from(self.reference.as_str()),
            Value::from(self.hash.as_str()),
            Value::from(self.start_date),
            Value::from(self.end_date),
        ])
    }

    fn from_legacy(array: &LegacyArray<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            reference: array.string(0)?,
            hash: array.opt_string(1)?.unwrap_or_default(),
            start_date: array.opt_i64(2)?.unwrap_or(0),
            end_date: array.opt_i64(3)?.unwrap_or(0),
        })
    }

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_str(&self.reference)?;
        packer.pack_str(&self.hash)?;
        packer.pack_i64(self.start_date)?;
        packer.pack_i64(self.end_date)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            reference: unpacker.unpack_string()?,
            hash: unpacker.unpack_string()?,
            start_date: unpacker.unpack_i64()?,
            end_date: unpacker.unpack_i64()?,
        })
    }
}

/// One permission granted by a power of attorney.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoaItem {
    pub tx_type: TxType,
    pub amount: Balance,
    pub assets: BTreeSet<String>,
}

impl PoaItem {
    pub fn new<I, S>(tx_type: TxType, amount: Balance, assets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tx_type,
            amount,
            assets: assets.into_iter().map(Into::into).collect(),
        }
    }

    /// Use up to `amount` of this item and return what is left. Non-positive
    /// requests change nothing.
    pub fn consume(&mut self, amount: &Balance) -> &Balance {
        if amount.is_positive() {
            if &self.amount <= amount {
                self.amount = Balance::zero();
            } else {
                self.amount -= amount;
            }
        }
        &self.amount
    }

    pub fn consumed(&self) -> bool {
        self.amount.is_zero()
    }

    fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::from(self.tx_type.id()),
            self.amount.to_value(),
            Value::Array(self.assets.iter().map(|a| Value::from(a.as_str())).collect()),
        ])
    }

    fn from_legacy(array: &LegacyArray<'_>) -> Result<Self, CodecError> {
        let assets = match array.opt_array(2)? {
            Some(list) => list
                .items()
                .iter()
                .map(|v| value_str(v).map(str::to_owned))
                .collect::<Result<BTreeSet<_>, _>>()?,
            None => BTreeSet::new(),
        };
        Ok(Self {
            tx_type: TxType(array.i32(0)?),
            amount: array.balance(1)?,
            assets,
        })
    }

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_i32(self.tx_type.id())?;
        self.amount.pack(packer)?;
        packer.pack_array_len(self.assets.len())?;
        for asset in &self.assets {
            packer.pack_str(asset)?;
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let tx_type = TxType(unpacker.unpack_i32()?);
        let amount = Balance::unpack(unpacker)?;
        let len = unpacker.unpack_array_len()?;
        let mut assets = BTreeSet::new();
        for _ in 0..len {
            assets.insert(unpacker.unpack_string()?);
        }
        Ok(Self {
            tx_type,
            amount,
            assets,
        })
    }
}

/// Full terms of one power of attorney.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoaDetail {
    pub reference: String,
    #[serde(rename = "issuer")]
    pub issuer_address: String,
    #[serde(rename = "attorney")]
    pub attorney_address: String,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub items: Vec<PoaItem>,
}

impl PoaDetail {
    /// Items granting `tx_type`.
    pub fn items_for(&self, tx_type: TxType) -> impl Iterator<Item = &PoaItem> {
        self.items.iter().filter(move |item| item.tx_type == tx_type)
    }

    /// Sum of the positive item amounts.
    pub fn sum_amounts(&self) -> Balance {
        self.items
            .iter()
            .filter(|item| item.amount.is_positive())
            .map(|item| &item.amount)
            .sum()
    }

    fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::from(self.reference.as_str()),
            Value::from(self.issuer_address.as_str()),
            Value::from(self.attorney_address.as_str()),
            Value::from(self.start_time),
            Value::from(self.end_time),
            Value::Array(self.items.iter().map(PoaItem::to_value).collect()),
        ])
    }

    fn from_legacy(array: &LegacyArray<'_>) -> Result<Self, CodecError> {
        let items = match array.opt_array(5)? {
            Some(list) => list
                .arrays()?
                .iter()
                .map(PoaItem::from_legacy)
                .collect::<Result<Vec<_>, _>>()?,
            None => Vec::new(),
        };
        Ok(Self {
            reference: array.string(0)?,
            issuer_address: array.string(1)?,
            attorney_address: array.string(2)?,
            start_time: array.i64(3)?,
            end_time: array.i64(4)?,
            items,
        })
    }

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_str(&self.reference)?;
        packer.pack_str(&self.issuer_address)?;
        packer.pack_str(&self.attorney_address)?;
        packer.pack_i64(self.start_time)?;
        packer.pack_i64(self.end_time)?;
        packer.pack_array_len(self.items.len())?;
        for item in &self.items {
            item.pack(packer)?;
        }
        Ok(())
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let reference = unpacker.unpack_string()?;
        let issuer_address = unpacker.unpack_string()?;
        let attorney_address = unpacker.unpack_string()?;
        let start_time = unpacker.unpack_i64()?;
        let end_time = unpacker.unpack_i64()?;
        let len = unpacker.unpack_array_len()?;
        let items = (0..len)
            .map(|_| PoaItem::unpack(unpacker))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            reference,
            issuer_address,
            attorney_address,
            start_time,
            end_time,
            items,
        })
    }
}

/// A power-of-attorney entry.
///
/// A *header* entry is keyed by the issuing address and lists the
/// references of every attorney that address has granted. A *detail* entry
/// is keyed `address|reference` and holds the terms of one grant. Reference
/// operations only act on header entries.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoaEntry {
    key: String,
    index: i64,
    headers: Option<BTreeMap<String, PoaHeader>>,
    detail: Option<PoaDetail>,
    #[serde(default = "unset_height")]
    update_height: BlockHeight,
}

impl PoaEntry {
    pub fn new(index: i64, key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            index,
            headers: None,
            detail: None,
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn detail(&self) -> Option<&PoaDetail> {
        self.detail.as_ref()
    }

    pub fn detail_mut(&mut self) -> Option<&mut PoaDetail> {
        self.detail.as_mut()
    }

    pub fn set_detail(&mut self, detail: PoaDetail) {
        self.detail = Some(detail);
    }

    pub fn headers(&self) -> impl Iterator<Item = &PoaHeader> {
        self.headers.iter().flat_map(|m| m.values())
    }

    /// Key of the detail entry for `reference` under this address.
    pub fn full_reference(&self, reference: &str) -> String {
        format!("{}|{}", self.key, reference)
    }

    /// Record a reference on a header entry. Returns `None` on a detail entry.
    pub fn set_reference(
        &mut self,
        reference: &str,
        start_date: Timestamp,
        end_date: Timestamp,
    ) -> Option<&PoaHeader> {
        if self.detail.is_some() {
            return None;
        }
        let headers = self.headers.get_or_insert_with(BTreeMap::new);
        headers.insert(
            reference.to_string(),
            PoaHeader {
                reference: reference.to_string(),
                hash: String::new(),
                start_date,
                end_date,
            },
        );
        headers.get(reference)
    }

    pub fn reference(&self, reference: &str) -> Option<&PoaHeader> {
        if self.detail.is_some() {
            return None;
        }
        self.headers.as_ref().and_then(|m| m.get(reference))
    }

    pub fn has_reference(&self, reference: &str) -> bool {
        self.reference(reference).is_some()
    }

    /// Drop `reference` from a header entry. False on a detail entry.
    pub fn remove_reference(&mut self, reference: &str) -> bool {
        if self.detail.is_some() {
            return false;
        }
        self.headers.get_or_insert_with(BTreeMap::new).remove(reference);
        true
    }

    /// Number of references on a header entry, zero on a detail entry.
    pub fn reference_count(&self) -> usize {
        if self.detail.is_some() {
            return 0;
        }
        self.headers.as_ref().map_or(0, BTreeMap::len)
    }
}

impl StateEntry for PoaEntry {
    fn key(&self) -> String {
        self.key.clone()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    /// `[index, key, [[reference, header], ...] | nil, detail | nil]`, plus the
    /// update height once set.
    fn encode(&self, index: i64) -> Value {
        let headers = match &self.headers {
            Some(map) => Value::Array(
                map.iter()
                    .map(|(r, h)| Value::Array(vec![Value::from(r.as_str()), h.to_value()]))
                    .collect(),
            ),
            None => Value::Nil,
        };
        let detail = self.detail.as_ref().map_or(Value::Nil, PoaDetail::to_value);
        let mut items = vec![Value::from(index), Value::from(self.key.as_str()), headers, detail];
        push_update_height(&mut items, self.update_height);
        Value::Array(items)
    }
}

impl EntryDecoder for PoaEntry {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        let mut entry = PoaEntry::new(array.i64(0)?, array.string(1)?);

        if let Some(list) = array.opt_array(2)? {
            let mut headers = BTreeMap::new();
            // Malformed pairs are skipped.
            for pair in list.arrays()?.into_iter().filter(|p| p.len() == 2) {
                let reference = pair.string(0)?;
                headers.insert(reference, PoaHeader::from_legacy(&pair.array(1)?)?);
            }
            entry.headers = Some(headers);
        }
        if let Some(detail) = array.opt_array(3)? {
            entry.detail = Some(PoaDetail::from_legacy(&detail)?);
        }
        if let Some(height) = array.opt_i64(4)? {
            entry.update_height = height;
        }
        Ok(entry)
    }
}

impl Packable for PoaEntry {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_str(&self.key)?;
        packer.pack_i64(self.index)?;
        match &self.headers {
            Some(map) => {
                packer.pack_array_len(map.len())?;
                for header in map.values() {
                    header.pack(packer)?;
                }
            }
            None => packer.pack_nil()?,
        }
        match &self.detail {
            Some(detail) => detail.pack(packer)?,
            None => packer.pack_nil()?,
        }
        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        read_version(unpacker, ENTRY, 0..=0)?;
        let key = unpacker.unpack_string()?;
        let mut entry = PoaEntry::new(unpacker.unpack_i64()?, key);

        if unpacker.next_is_nil() {
            unpacker.unpack_nil()?;
        } else {
            let len = unpacker.unpack_array_len()?;
            let mut headers = BTreeMap::new();
            for _ in 0..len {
                let header = PoaHeader::unpack(unpacker)?;
                headers.insert(header.reference.clone(), header);
            }
            entry.headers = Some(headers);
        }

        if unpacker.next_is_nil() {
            unpacker.unpack_nil()?;
        } else {
            entry.detail = Some(PoaDetail::unpack(unpacker)?);
        }

        entry.update_height = unpacker.unpack_i64()?;
        Ok(entry)
    }
}

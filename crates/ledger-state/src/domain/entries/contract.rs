use crate::domain::contract_data::ContractData;
use crate::ports::{EntryDecoder, Packable, StateEntry};
use shared_types::codec::{read_version, LegacyArray, Packer, Unpacker};
use shared_types::{BlockHeight, CodecError, Value, UNSET_HEIGHT};
use tracing::warn;

const ENTRY: &str = "ContractEntry";
const VERSION: u8 = 0;

/// One contract instance, keyed by its contract address.
#[derive(Clone, Debug, PartialEq)]
pub struct ContractEntry {
    index: i64,
    contract_address: String,
    data: ContractData,
    update_height: BlockHeight,
}

impl ContractEntry {
    pub fn new(index: i64, contract_address: impl Into<String>, data: ContractData) -> Self {
        Self {
            index,
            contract_address: contract_address.into(),
            data,
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn index(&self) -> i64 {
        self.index
    }

    pub fn contract_address(&self) -> &str {
        &self.contract_address
    }

    pub fn data(&self) -> &ContractData {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut ContractData {
        &mut self.data
    }

    pub fn set_data(&mut self, data: ContractData) {
        self.data = data;
    }

    pub fn function(&self) -> Option<&'static str> {
        self.data.function()
    }
}

impl StateEntry for ContractEntry {
    fn key(&self) -> String {
        self.contract_address.clone()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    /// `[index, address, [dictionary, nil]]`, plus the update height once
    /// set. A negative `index` writes the entry's own index.
    fn encode(&self, index: i64) -> Value {
        let index = if index < 0 { self.index } else { index };
        let mut items = vec![
            super::legacy_index(index),
            Value::from(self.contract_address.as_str()),
            Value::Array(vec![self.data.to_value(), Value::Nil]),
        ];
        super::push_update_height(&mut items, self.update_height);
        Value::Array(items)
    }
}

impl EntryDecoder for ContractEntry {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        if array.len() < 3 {
            return Err(CodecError::MissingField {
                entry: ENTRY,
                index: array.len(),
            });
        }
        let data = match array.opt_array(2)? {
            Some(payload) => match payload.opt_value(0) {
                Some(dict) => ContractData::from_value(dict)?,
                None => ContractData::default(),
            },
            None => ContractData::default(),
        };
        let mut entry = ContractEntry::new(array.i64(0)?, array.string(1)?, data);
        if let Some(height) = array.opt_i64(3)? {
            entry.set_block_update_height(height);
        }
        Ok(entry)
    }
}

impl Packable for ContractEntry {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_str(&self.contract_address)?;
        packer.pack_i64(self.index)?;
        packer.pack_value(&self.data.to_value())?;
        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        read_version(unpacker, ENTRY, 0..=0)?;
        let contract_address = unpacker.unpack_string()?;
        let index = unpacker.unpack_i64()?;
        let data = ContractData::from_value(&unpacker.unpack_value()?).map_err(|e| {
            warn!(entry = ENTRY, address = %contract_address, error = %e, "Undecodable contract data");
            e
        })?;
        let mut entry = ContractEntry::new(index, contract_address, data);
        entry.update_height = unpacker.unpack_i64()?;
        Ok(entry)
    }
}

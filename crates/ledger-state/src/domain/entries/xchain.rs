use super::{push_update_height, unset_height};
use crate::ports::{EntryDecoder, Packable, StateEntry};
use serde::{Deserialize, Serialize};
use shared_types::codec::{read_version, value_str, LegacyArray, Packer, Unpacker};
use shared_types::{Balance, BlockHeight, CodecError, Value, UNSET_HEIGHT};
use std::collections::BTreeMap;

const ENTRY: &str = "XChainDetails";
const VERSION: u8 = 1;

/// Link to another chain: its signing nodes and the last height seen.
///
/// Treated as an immutable value. The `with_*` methods return the updated
/// copy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct XChainDetails {
    chain_id: i32,
    block_height: i64,
    sign_nodes: BTreeMap<String, Balance>,
    parameters: i64,
    status: i64,
    #[serde(default = "unset_height")]
    update_height: BlockHeight,
}

impl XChainDetails {
    pub fn new(
        chain_id: i32,
        block_height: i64,
        sign_nodes: BTreeMap<String, Balance>,
        parameters: i64,
        status: i64,
    ) -> Self {
        Self {
            chain_id,
            block_height,
            sign_nodes,
            parameters,
            status,
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn chain_id(&self) -> i32 {
        self.chain_id
    }

    pub fn block_height(&self) -> i64 {
        self.block_height
    }

    pub fn sign_nodes(&self) -> &BTreeMap<String, Balance> {
        &self.sign_nodes
    }

    pub fn parameters(&self) -> i64 {
        self.parameters
    }

    pub fn status(&self) -> i64 {
        self.status
    }

    /// The block height of a linked chain never goes backwards.
    pub fn with_block_height(self, height: i64) -> Self {
        Self {
            block_height: self.block_height.max(height),
            ..self
        }
    }

    pub fn with_parameters(self, parameters: i64) -> Self {
        Self { parameters, ..self }
    }

    pub fn with_status(self, status: i64) -> Self {
        Self { status, ..self }
    }

    pub fn with_sign_nodes<I>(self, nodes: I) -> Self
    where
        I: IntoIterator<Item = (String, Balance)>,
    {
        Self {
            sign_nodes: nodes.into_iter().collect(),
            ..self
        }
    }

    fn raw_sign_nodes(&self) -> Value {
        Value::Array(
            self.sign_nodes
                .iter()
                .flat_map(|(node, balance)| [Value::from(node.as_str()), balance.to_value()])
                .collect(),
        )
    }
}

impl StateEntry for XChainDetails {
    fn key(&self) -> String {
        self.chain_id.to_string()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    /// `[chain_id, block_height, [node, balance, ...], parameters, status]`.
    /// The index is not part of this form.
    fn encode(&self, _index: i64) -> Value {
        let mut items = vec![
            Value::from(self.chain_id),
            Value::from(self.block_height),
            self.raw_sign_nodes(),
            Value::from(self.parameters),
            Value::from(self.status),
        ];
        push_update_height(&mut items, self.update_height);
        Value::Array(items)
    }
}

impl EntryDecoder for XChainDetails {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        let raw = array.array(2)?;
        if raw.len() % 2 != 0 {
            return Err(CodecError::Malformed(format!(
                "{ENTRY}: sign node list has odd length {}",
                raw.len()
            )));
        }
        let sign_nodes = raw
            .items()
            .chunks(2)
            .map(|pair| -> Result<(String, Balance), CodecError> {
                Ok((value_str(&pair[0])?.to_string(), Balance::from_value(&pair[1])?))
            })
            .collect::<Result<BTreeMap<_, _>, _>>()?;

        let mut details = XChainDetails::new(
            array.i32(0)?,
            array.i64(1)?,
            sign_nodes,
            array.i64(3)?,
            array.i64(4)?,
        );
        if let Some(height) = array.opt_i64(5)? {
            details.update_height = height;
        }
        Ok(details)
    }
}

impl Packable for XChainDetails {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_i32(self.chain_id)?;
        packer.pack_i64(self.block_height)?;
        packer.pack_map_len(self.sign_nodes.len())?;
        for (node, balance) in &self.sign_nodes {
            packer.pack_str(node)?;
            balance.pack(packer)?;
        }
        packer.pack_i64(self.parameters)?;
        packer.pack_i64(self.status)?;
        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let version = read_version(unpacker, ENTRY, 0..=1)?;
        let chain_id = unpacker.unpack_i32()?;
        let block_height = unpacker.unpack_i64()?;
        let len = unpacker.unpack_map_len()?;
        let mut sign_nodes = BTreeMap::new();
        for _ in 0..len {
            let node = unpacker.unpack_string()?;
            sign_nodes.insert(node, Balance::unpack(unpacker)?);
        }
        let parameters = unpacker.unpack_i64()?;
        let status = unpacker.unpack_i64()?;
        let mut details = XChainDetails::new(chain_id, block_height, sign_nodes, parameters, status);
        if version >= 1 {
            details.update_height = unpacker.unpack_i64()?;
        }
        Ok(details)
    }
}

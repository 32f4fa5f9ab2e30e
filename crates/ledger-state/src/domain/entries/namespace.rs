use super::{legacy_index, push_update_height};
use crate::ports::{EntryDecoder, Packable, StateEntry};
use serde::{Deserialize, Serialize};
use shared_types::codec::{
    map_value, opt_str_value, read_version, value_str, LegacyArray, Packer, Unpacker,
};
use shared_types::{BlockHeight, CodecError, Value, UNSET_HEIGHT};
use std::collections::{BTreeMap, BTreeSet};

const ENTRY: &str = "NamespaceEntry";
const ASSET_ENTRY: &str = "NamespaceAsset";
const VERSION: u8 = 1;

/// An asset class registered in a namespace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceAsset {
    asset_id: String,
    metadata: Option<String>,
}

impl NamespaceAsset {
    pub fn new(asset_id: impl Into<String>, metadata: Option<String>) -> Self {
        Self {
            asset_id: asset_id.into(),
            metadata,
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn metadata(&self) -> Option<&str> {
        self.metadata.as_deref()
    }

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(0)?;
        packer.pack_str(&self.asset_id)?;
        packer.pack_opt_str(self.metadata.as_deref())
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        read_version(unpacker, ASSET_ENTRY, 0..=0)?;
        let asset_id = unpacker.unpack_string()?;
        // Any non-string metadata value reads as absent.
        let metadata = match unpacker.unpack_value()? {
            Value::String(s) => Some(s.into_str().ok_or(CodecError::InvalidUtf8)?),
            _ => None,
        };
        Ok(Self { asset_id, metadata })
    }
}

/// A namespace: a named group of asset classes owned by one address.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceEntry {
    name: String,
    owner_address: String,
    metadata: String,
    classes: BTreeMap<String, NamespaceAsset>,
    #[serde(default = "super::unset_height")]
    update_height: BlockHeight,
}

impl NamespaceEntry {
    pub fn new(
        name: impl Into<String>,
        owner_address: impl Into<String>,
        metadata: Option<String>,
    ) -> Self {
        Self {
            name: name.into(),
            owner_address: owner_address.into(),
            metadata: metadata.unwrap_or_default(),
            classes: BTreeMap::new(),
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner_address(&self) -> &str {
        &self.owner_address
    }

    pub fn set_owner_address(&mut self, address: impl Into<String>) {
        self.owner_address = address.into();
    }

    pub fn metadata(&self) -> &str {
        &self.metadata
    }

    pub fn set_metadata(&mut self, metadata: Option<String>) {
        self.metadata = metadata.unwrap_or_default();
    }

    pub fn classes(&self) -> &BTreeMap<String, NamespaceAsset> {
        &self.classes
    }

    pub fn contains_asset(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    pub fn asset(&self, name: &str) -> Option<&NamespaceAsset> {
        self.classes.get(name)
    }

    /// Register `asset` under its own asset id, replacing any previous one.
    pub fn set_asset(&mut self, asset: NamespaceAsset) {
        self.classes.insert(asset.asset_id.clone(), asset);
    }

    pub fn remove_asset(&mut self, name: &str) -> bool {
        self.classes.remove(name).is_some()
    }

    pub fn class_metadata(&self, name: &str) -> Option<&str> {
        self.classes.get(name).and_then(|a| a.metadata())
    }

    pub fn all_asset_names(&self) -> BTreeSet<String> {
        self.classes.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl StateEntry for NamespaceEntry {
    fn key(&self) -> String {
        self.name.clone()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    /// `[index, name, [[name, owner, {class: [id, metadata]}, metadata], nil]]`
    /// with the update height appended to the payload once set.
    fn encode(&self, index: i64) -> Value {
        let classes = map_value(self.classes.iter().map(|(name, asset)| {
            (
                name.clone(),
                Value::Array(vec![
                    Value::from(asset.asset_id.as_str()),
                    opt_str_value(asset.metadata()),
                ]),
            )
        }));
        let core = Value::Array(vec![
            Value::from(self.name.as_str()),
            Value::from(self.owner_address.as_str()),
            classes,
            Value::from(self.metadata.as_str()),
        ]);
        let mut payload = vec![core, Value::Nil];
        push_update_height(&mut payload, self.update_height);
        Value::Array(vec![
            legacy_index(index),
            Value::from(self.name.as_str()),
            Value::Array(payload),
        ])
    }
}

impl EntryDecoder for NamespaceEntry {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        let name = array.string(1)?;
        let data = array.array(2)?;
        let core = data.array(0)?;

        let metadata = if core.len() > 3 { core.opt_string(3)? } else { None };
        let mut entry = NamespaceEntry::new(name, core.string(1)?, metadata);

        if let Some(pairs) = core.opt_map(2)? {
            for (class, class_data) in pairs {
                let class_data = LegacyArray::new(class_data, ENTRY)?;
                entry.classes.insert(
                    value_str(class)?.to_string(),
                    NamespaceAsset::new(class_data.string(0)?, class_data.opt_string(1)?),
                );
            }
        }

        if let Some(height) = data.opt_i64(2)? {
            entry.update_height = height;
        }
        Ok(entry)
    }
}

impl Packable for NamespaceEntry {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_str(&self.name)?;
        packer.pack_str(&self.owner_address)?;
        packer.pack_str(&self.metadata)?;
        packer.pack_map_len(self.classes.len())?;
        for (name, asset) in &self.classes {
            packer.pack_str(name)?;
            asset.pack(packer)?;
        }
        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        let version = read_version(unpacker, ENTRY, 0..=1)?;
        let name = unpacker.unpack_string()?;
        let owner = unpacker.unpack_string()?;
        let metadata = unpacker.unpack_string()?;
        let mut entry = NamespaceEntry::new(name, owner, Some(metadata));
        let len = unpacker.unpack_map_len()?;
        for _ in 0..len {
            let class = unpacker.unpack_string()?;
            entry.classes.insert(class, NamespaceAsset::unpack(unpacker)?);
        }
        if version >= 1 {
            entry.update_height = unpacker.unpack_i64()?;
        }
        Ok(entry)
    }
}

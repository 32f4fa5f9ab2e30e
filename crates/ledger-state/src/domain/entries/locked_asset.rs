use super::unset_height;
use crate::ports::{EntryDecoder, Packable, StateEntry};
use serde::{Deserialize, Serialize};
use shared_types::codec::{read_version, LegacyArray, Packer, Unpacker};
use shared_types::{BlockHeight, CodecError, Value, UNSET_HEIGHT};

const ENTRY: &str = "LockedAsset";
const VERSION: u8 = 0;

/// How far an asset is locked against movement.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i32", into = "i32")]
pub enum LockType {
    #[default]
    NoLock = 0,
    Full = 1,
}

impl LockType {
    pub fn code(self) -> i32 {
        self as i32
    }
}

impl TryFrom<i32> for LockType {
    type Error = CodecError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(LockType::NoLock),
            1 => Ok(LockType::Full),
            other => Err(CodecError::UnknownCode {
                what: "lock type",
                code: other as i64,
            }),
        }
    }
}

impl From<LockType> for i32 {
    fn from(t: LockType) -> i32 {
        t.code()
    }
}

/// Lock state of one asset, keyed by its full asset id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockedAsset {
    #[serde(rename = "key")]
    asset_id: String,
    #[serde(rename = "type")]
    lock_type: LockType,
    #[serde(default = "unset_height")]
    update_height: BlockHeight,
}

impl LockedAsset {
    pub fn new(asset_id: impl Into<String>, lock_type: LockType) -> Self {
        Self {
            asset_id: asset_id.into(),
            lock_type,
            update_height: UNSET_HEIGHT,
        }
    }

    pub fn asset_id(&self) -> &str {
        &self.asset_id
    }

    pub fn lock_type(&self) -> LockType {
        self.lock_type
    }

    /// Change the lock. The update height only moves when the type changes.
    pub fn set_lock_type(&mut self, lock_type: LockType, height: BlockHeight) {
        if self.lock_type != lock_type {
            self.lock_type = lock_type;
            self.set_block_update_height(height);
        }
    }
}

impl StateEntry for LockedAsset {
    fn key(&self) -> String {
        self.asset_id.clone()
    }

    fn block_update_height(&self) -> BlockHeight {
        self.update_height
    }

    fn set_block_update_height(&mut self, height: BlockHeight) {
        self.update_height = self.update_height.max(height);
    }

    /// `[0, asset_id, code]`, plus the update height once set. The index is
    /// always written as zero.
    fn encode(&self, _index: i64) -> Value {
        let mut items = vec![
            Value::from(0),
            Value::from(self.asset_id.as_str()),
            Value::from(self.lock_type.code()),
        ];
        super::push_update_height(&mut items, self.update_height);
        Value::Array(items)
    }
}

impl EntryDecoder for LockedAsset {
    fn decode(value: &Value) -> Result<Self, CodecError> {
        let array = LegacyArray::new(value, ENTRY)?;
        let mut asset = LockedAsset::new(array.string(1)?, LockType::try_from(array.i32(2)?)?);
        if let Some(height) = array.opt_i64(3)? {
            asset.set_block_update_height(height);
        }
        Ok(asset)
    }
}

impl Packable for LockedAsset {
    const ENTRY_NAME: &'static str = ENTRY;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_version(VERSION)?;
        packer.pack_str(&self.asset_id)?;
        packer.pack_i32(self.lock_type.code())?;
        packer.pack_i64(self.update_height)
    }

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        read_version(unpacker, ENTRY, 0..=0)?;
        let mut asset = LockedAsset::new(
            unpacker.unpack_string()?,
            LockType::try_from(unpacker.unpack_i32()?)?,
        );
        asset.update_height = unpacker.unpack_i64()?;
        Ok(asset)
    }
}

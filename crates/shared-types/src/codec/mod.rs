//! # Canonical Codec
//!
//! Two encodings exist for every state entry:
//!
//! - **Packed**: versioned MessagePack written field by field through
//!   [`Packer`] and read back through [`Unpacker`]. This is the form that
//!   gets hashed and persisted.
//! - **Legacy array**: a positional [`rmpv::Value`] tree read through
//!   [`LegacyArray`]. Still required for hash compatibility with older state.
//!
//! Maps are always written in ascending key order.

pub mod legacy;
pub mod packer;
pub mod unpacker;
pub mod version;

pub use legacy::{map_value, opt_str_value, value_i64, value_str, LegacyArray};
pub use packer::Packer;
pub use unpacker::{DecodeLimits, Unpacker};
pub use version::read_version;

use crate::errors::CodecError;
use rmpv::Value;

/// Types with a canonical packed form.
pub trait Packable: Sized {
    /// Name used in error messages and logs.
    const ENTRY_NAME: &'static str;

    fn pack(&self, packer: &mut Packer) -> Result<(), CodecError>;

    fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError>;

    fn to_packed_bytes(&self) -> Result<Vec<u8>, CodecError> {
        let mut packer = Packer::new();
        self.pack(&mut packer)?;
        Ok(packer.into_bytes())
    }

    fn from_packed_bytes(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::from_packed_bytes_with_limits(bytes, DecodeLimits::default())
    }

    /// Decode one complete value, rejecting trailing bytes.
    fn from_packed_bytes_with_limits(bytes: &[u8], limits: DecodeLimits) -> Result<Self, CodecError> {
        let mut unpacker = Unpacker::with_limits(bytes, limits);
        let value = Self::unpack(&mut unpacker)?;
        unpacker.finish(Self::ENTRY_NAME)?;
        Ok(value)
    }
}

/// Serialise a legacy value tree to bytes.
pub fn value_to_bytes(value: &Value) -> Result<Vec<u8>, CodecError> {
    let mut packer = Packer::new();
    packer.pack_value(value)?;
    Ok(packer.into_bytes())
}

/// Parse bytes holding exactly one legacy value tree.
pub fn value_from_bytes(bytes: &[u8]) -> Result<Value, CodecError> {
    let mut unpacker = Unpacker::new(bytes);
    let value = unpacker.unpack_value()?;
    unpacker.finish("legacy value")?;
    Ok(value)
}

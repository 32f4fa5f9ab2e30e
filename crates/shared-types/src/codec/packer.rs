use crate::errors::CodecError;
use rmpv::Value;

/// Append-only MessagePack writer producing the canonical bytes of an entry.
///
/// Integers are always written in their most compact form, so two packers
/// fed the same logical values produce identical bytes.
#[derive(Debug, Default)]
pub struct Packer {
    buf: Vec<u8>,
}

fn write_err(e: impl std::fmt::Display) -> CodecError {
    CodecError::Write(e.to_string())
}

fn header_len(what: &'static str, len: usize) -> Result<u32, CodecError> {
    u32::try_from(len).map_err(|_| CodecError::LengthLimit {
        what,
        len,
        max: u32::MAX as usize,
    })
}

impl Packer {
    pub fn new() -> Self {
        Self { buf: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn pack_nil(&mut self) -> Result<(), CodecError> {
        rmp::encode::write_nil(&mut self.buf).map_err(write_err)
    }

    pub fn pack_bool(&mut self, value: bool) -> Result<(), CodecError> {
        rmp::encode::write_bool(&mut self.buf, value).map_err(write_err)
    }

    pub fn pack_i64(&mut self, value: i64) -> Result<(), CodecError> {
        rmp::encode::write_sint(&mut self.buf, value)
            .map(|_| ())
            .map_err(write_err)
    }

    pub fn pack_i32(&mut self, value: i32) -> Result<(), CodecError> {
        self.pack_i64(i64::from(value))
    }

    /// Version tags are small non-negative integers written first.
    pub fn pack_version(&mut self, version: u8) -> Result<(), CodecError> {
        self.pack_i64(i64::from(version))
    }

    pub fn pack_str(&mut self, value: &str) -> Result<(), CodecError> {
        rmp::encode::write_str(&mut self.buf, value).map_err(write_err)
    }

    /// Pack `Some(s)` as a string and `None` as nil.
    pub fn pack_opt_str(&mut self, value: Option<&str>) -> Result<(), CodecError> {
        match value {
            Some(s) => self.pack_str(s),
            None => self.pack_nil(),
        }
    }

    pub fn pack_array_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = header_len("array", len)?;
        rmp::encode::write_array_len(&mut self.buf, len)
            .map(|_| ())
            .map_err(write_err)
    }

    pub fn pack_map_len(&mut self, len: usize) -> Result<(), CodecError> {
        let len = header_len("map", len)?;
        rmp::encode::write_map_len(&mut self.buf, len)
            .map(|_| ())
            .map_err(write_err)
    }

    pub fn pack_ext(&mut self, type_id: i8, data: &[u8]) -> Result<(), CodecError> {
        let len = header_len("ext", data.len())?;
        rmp::encode::write_ext_meta(&mut self.buf, len, type_id).map_err(write_err)?;
        self.buf.extend_from_slice(data);
        Ok(())
    }

    /// Write a dynamic value tree, used for dictionaries and legacy arrays.
    pub fn pack_value(&mut self, value: &Value) -> Result<(), CodecError> {
        rmpv::encode::write_value(&mut self.buf, value).map_err(write_err)
    }
}

use crate::errors::CodecError;
use rmp::Marker;
use rmpv::Value;

/// Bounds applied to length headers read from untrusted bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DecodeLimits {
    /// Maximum element count of any array or map header.
    pub max_collection_len: usize,
    /// Maximum byte length of any string or ext payload.
    pub max_string_len: usize,
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self {
            max_collection_len: 100_000,
            max_string_len: 1024 * 1024,
        }
    }
}

/// Deepest nesting accepted inside a dynamic value.
pub const MAX_VALUE_DEPTH: usize = 32;

/// Cursor over a packed entry.
///
/// Each `unpack_*` call consumes exactly one value; a type mismatch is an
/// error, never a silent conversion.
#[derive(Debug)]
pub struct Unpacker<'a> {
    buf: &'a [u8],
    limits: DecodeLimits,
}

impl<'a> Unpacker<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_limits(bytes, DecodeLimits::default())
    }

    pub fn with_limits(bytes: &'a [u8], limits: DecodeLimits) -> Self {
        Self { buf: bytes, limits }
    }

    pub fn limits(&self) -> DecodeLimits {
        self.limits
    }

    pub fn remaining(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Look at the next marker without consuming it.
    pub fn peek_marker(&self) -> Result<Marker, CodecError> {
        self.buf
            .first()
            .map(|b| Marker::from_u8(*b))
            .ok_or(CodecError::UnexpectedEof)
    }

    pub fn next_is_nil(&self) -> bool {
        matches!(self.peek_marker(), Ok(Marker::Null))
    }

    fn mismatch(expected: &'static str, marker: Marker) -> CodecError {
        CodecError::UnexpectedType {
            expected,
            found: format!("{marker:?}"),
        }
    }

    pub fn unpack_nil(&mut self) -> Result<(), CodecError> {
        let marker = self.peek_marker()?;
        rmp::decode::read_nil(&mut self.buf).map_err(|_| Self::mismatch("nil", marker))
    }

    pub fn unpack_bool(&mut self) -> Result<bool, CodecError> {
        let marker = self.peek_marker()?;
        rmp::decode::read_bool(&mut self.buf).map_err(|_| Self::mismatch("bool", marker))
    }

    pub fn unpack_i64(&mut self) -> Result<i64, CodecError> {
        let marker = self.peek_marker()?;
        rmp::decode::read_int(&mut self.buf).map_err(|_| Self::mismatch("i64", marker))
    }

    pub fn unpack_i32(&mut self) -> Result<i32, CodecError> {
        let marker = self.peek_marker()?;
        rmp::decode::read_int(&mut self.buf).map_err(|_| Self::mismatch("i32", marker))
    }

    pub fn unpack_string(&mut self) -> Result<String, CodecError> {
        let marker = self.peek_marker()?;
        let len = rmp::decode::read_str_len(&mut self.buf)
            .map_err(|_| Self::mismatch("string", marker))? as usize;
        self.check_len("string", len, self.limits.max_string_len)?;
        let bytes = self.take(len)?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8)
    }

    /// A string or nil.
    pub fn unpack_opt_string(&mut self) -> Result<Option<String>, CodecError> {
        if self.next_is_nil() {
            self.unpack_nil()?;
            return Ok(None);
        }
        self.unpack_string().map(Some)
    }

    pub fn unpack_array_len(&mut self) -> Result<usize, CodecError> {
        let marker = self.peek_marker()?;
        let len = rmp::decode::read_array_len(&mut self.buf)
            .map_err(|_| Self::mismatch("array", marker))? as usize;
        self.check_len("array", len, self.limits.max_collection_len)?;
        Ok(len)
    }

    pub fn unpack_map_len(&mut self) -> Result<usize, CodecError> {
        let marker = self.peek_marker()?;
        let len = rmp::decode::read_map_len(&mut self.buf)
            .map_err(|_| Self::mismatch("map", marker))? as usize;
        self.check_len("map", len, self.limits.max_collection_len)?;
        Ok(len)
    }

    /// Read an ext header and return its type id and payload.
    pub fn unpack_ext(&mut self) -> Result<(i8, &'a [u8]), CodecError> {
        let marker = self.peek_marker()?;
        let meta =
            rmp::decode::read_ext_meta(&mut self.buf).map_err(|_| Self::mismatch("ext", marker))?;
        let len = meta.size as usize;
        self.check_len("ext", len, self.limits.max_string_len)?;
        let payload = self.take(len)?;
        Ok((meta.typeid, payload))
    }

    /// Read the next value as a dynamic tree.
    ///
    /// Every nested header is checked against the limits, and nesting is
    /// bounded by [`MAX_VALUE_DEPTH`].
    pub fn unpack_value(&mut self) -> Result<Value, CodecError> {
        self.unpack_value_at(0)
    }

    fn unpack_value_at(&mut self, depth: usize) -> Result<Value, CodecError> {
        if depth > MAX_VALUE_DEPTH {
            return Err(CodecError::LengthLimit {
                what: "nesting",
                len: depth,
                max: MAX_VALUE_DEPTH,
            });
        }
        match self.peek_marker()? {
            Marker::Null => self.unpack_nil().map(|()| Value::Nil),
            Marker::True | Marker::False => self.unpack_bool().map(Value::Boolean),
            Marker::FixStr(_) | Marker::Str8 | Marker::Str16 | Marker::Str32 => {
                self.unpack_string().map(Value::from)
            }
            Marker::Bin8 | Marker::Bin16 | Marker::Bin32 => {
                let marker = self.peek_marker()?;
                let len = rmp::decode::read_bin_len(&mut self.buf)
                    .map_err(|_| Self::mismatch("binary", marker))? as usize;
                self.check_len("binary", len, self.limits.max_string_len)?;
                Ok(Value::Binary(self.take(len)?.to_vec()))
            }
            Marker::FixArray(_) | Marker::Array16 | Marker::Array32 => {
                let len = self.unpack_array_len()?;
                let mut items = Vec::with_capacity(len.min(self.buf.len()));
                for _ in 0..len {
                    items.push(self.unpack_value_at(depth + 1)?);
                }
                Ok(Value::Array(items))
            }
            Marker::FixMap(_) | Marker::Map16 | Marker::Map32 => {
                let len = self.unpack_map_len()?;
                let mut pairs = Vec::with_capacity(len.min(self.buf.len()));
                for _ in 0..len {
                    let key = self.unpack_value_at(depth + 1)?;
                    let value = self.unpack_value_at(depth + 1)?;
                    pairs.push((key, value));
                }
                Ok(Value::Map(pairs))
            }
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                let (type_id, payload) = self.unpack_ext()?;
                Ok(Value::Ext(type_id, payload.to_vec()))
            }
            Marker::Reserved => Err(CodecError::Malformed("reserved marker 0xc1".into())),
            // Numbers carry no length header.
            _ => rmpv::decode::read_value(&mut self.buf)
                .map_err(|e| CodecError::Malformed(e.to_string())),
        }
    }

    /// Fail unless every byte has been consumed.
    pub fn finish(&self, entry: &'static str) -> Result<(), CodecError> {
        if self.buf.is_empty() {
            Ok(())
        } else {
            Err(CodecError::TrailingBytes {
                entry,
                remaining: self.buf.len(),
            })
        }
    }

    fn check_len(&self, what: &'static str, len: usize, max: usize) -> Result<(), CodecError> {
        if len > max {
            return Err(CodecError::LengthLimit { what, len, max });
        }
        Ok(())
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.buf.len() < len {
            return Err(CodecError::UnexpectedEof);
        }
        let (head, tail) = self.buf.split_at(len);
        self.buf = tail;
        Ok(head)
    }
}

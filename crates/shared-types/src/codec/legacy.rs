//! Positional access to the legacy array form of state entries.
//!
//! The legacy form is a heterogeneous array such as
//! `[index, key, [core_fields, nil, trailing...]]`. Readers must tolerate
//! arrays shorter than the longest shape, so every accessor has an `opt_`
//! counterpart that maps a missing or nil slot to `None`.

use crate::balance::Balance;
use crate::errors::CodecError;
use rmpv::Value;

/// Short description of a value's type, for error messages.
pub fn value_kind(value: &Value) -> String {
    match value {
        Value::Nil => "nil",
        Value::Boolean(_) => "bool",
        Value::Integer(_) => "integer",
        Value::F32(_) | Value::F64(_) => "float",
        Value::String(_) => "string",
        Value::Binary(_) => "binary",
        Value::Array(_) => "array",
        Value::Map(_) => "map",
        Value::Ext(..) => "ext",
    }
    .to_string()
}

fn mismatch(expected: &'static str, value: &Value) -> CodecError {
    CodecError::UnexpectedType {
        expected,
        found: value_kind(value),
    }
}

pub fn value_str(value: &Value) -> Result<&str, CodecError> {
    match value {
        Value::String(s) => s.as_str().ok_or(CodecError::InvalidUtf8),
        other => Err(mismatch("string", other)),
    }
}

pub fn value_i64(value: &Value) -> Result<i64, CodecError> {
    value.as_i64().ok_or_else(|| mismatch("i64", value))
}

/// Build a legacy map value from already sorted pairs.
pub fn map_value<I>(pairs: I) -> Value
where
    I: IntoIterator<Item = (String, Value)>,
{
    Value::Map(
        pairs
            .into_iter()
            .map(|(k, v)| (Value::from(k), v))
            .collect(),
    )
}

/// Optional string as a legacy slot: `None` becomes nil.
pub fn opt_str_value(value: Option<&str>) -> Value {
    value.map(Value::from).unwrap_or(Value::Nil)
}

/// Borrowed view of one legacy array.
#[derive(Clone, Copy, Debug)]
pub struct LegacyArray<'a> {
    entry: &'static str,
    items: &'a [Value],
}

impl<'a> LegacyArray<'a> {
    /// View `value` as an array, failing if it is anything else.
    pub fn new(value: &'a Value, entry: &'static str) -> Result<Self, CodecError> {
        match value {
            Value::Array(items) => Ok(Self { entry, items }),
            other => Err(mismatch("array", other)),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &'a [Value] {
        self.items
    }

    /// Value at `index`; nil counts as present.
    pub fn value(&self, index: usize) -> Result<&'a Value, CodecError> {
        self.items.get(index).ok_or(CodecError::MissingField {
            entry: self.entry,
            index,
        })
    }

    /// Value at `index` unless missing or nil.
    pub fn opt_value(&self, index: usize) -> Option<&'a Value> {
        self.items.get(index).filter(|v| !v.is_nil())
    }

    pub fn is_nil(&self, index: usize) -> bool {
        self.opt_value(index).is_none()
    }

    pub fn string(&self, index: usize) -> Result<String, CodecError> {
        value_str(self.value(index)?).map(str::to_owned)
    }

    pub fn opt_string(&self, index: usize) -> Result<Option<String>, CodecError> {
        self.opt_value(index)
            .map(|v| value_str(v).map(str::to_owned))
            .transpose()
    }

    pub fn i64(&self, index: usize) -> Result<i64, CodecError> {
        value_i64(self.value(index)?)
    }

    pub fn opt_i64(&self, index: usize) -> Result<Option<i64>, CodecError> {
        self.opt_value(index).map(value_i64).transpose()
    }

    pub fn i32(&self, index: usize) -> Result<i32, CodecError> {
        let v = self.i64(index)?;
        i32::try_from(v).map_err(|_| CodecError::Malformed(format!("{v} does not fit in i32")))
    }

    pub fn balance(&self, index: usize) -> Result<Balance, CodecError> {
        Balance::from_value(self.value(index)?)
    }

    pub fn array(&self, index: usize) -> Result<LegacyArray<'a>, CodecError> {
        LegacyArray::new(self.value(index)?, self.entry)
    }

    pub fn opt_array(&self, index: usize) -> Result<Option<LegacyArray<'a>>, CodecError> {
        self.opt_value(index)
            .map(|v| LegacyArray::new(v, self.entry))
            .transpose()
    }

    pub fn map(&self, index: usize) -> Result<&'a [(Value, Value)], CodecError> {
        match self.value(index)? {
            Value::Map(pairs) => Ok(pairs.as_slice()),
            other => Err(mismatch("map", other)),
        }
    }

    pub fn opt_map(&self, index: usize) -> Result<Option<&'a [(Value, Value)]>, CodecError> {
        match self.opt_value(index) {
            None => Ok(None),
            Some(Value::Map(pairs)) => Ok(Some(pairs.as_slice())),
            Some(other) => Err(mismatch("map", other)),
        }
    }

    /// Sub-array views of every element.
    pub fn arrays(&self) -> Result<Vec<LegacyArray<'a>>, CodecError> {
        self.items
            .iter()
            .map(|v| LegacyArray::new(v, self.entry))
            .collect()
    }
}

use serde::{Deserialize, Serialize};
use shared_types::codec::{LegacyArray, Packer, Unpacker};
use shared_types::{eq_ignore_case, CodecError, Timestamp, Value};

/// Time window during which one address may act on an encumbrance.
///
/// `end_time == 0` means open-ended. A non-zero end before the start is
/// raised to the start on construction.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "RawDetail")]
pub struct EncumbranceDetail {
    address: String,
    start_time: Timestamp,
    end_time: Timestamp,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawDetail {
    #[serde(default)]
    address: Option<String>,
    #[serde(default)]
    start_time: Timestamp,
    #[serde(default)]
    end_time: Timestamp,
}

impl From<RawDetail> for EncumbranceDetail {
    fn from(raw: RawDetail) -> Self {
        EncumbranceDetail::new(raw.address.unwrap_or_default(), raw.start_time, raw.end_time)
    }
}

impl EncumbranceDetail {
    pub fn new(address: impl Into<String>, start_time: Timestamp, end_time: Timestamp) -> Self {
        let end_time = if end_time == 0 {
            0
        } else {
            end_time.max(start_time)
        };
        Self {
            address: address.into(),
            start_time,
            end_time,
        }
    }

    /// Placeholder for malformed legacy details: no address, one-second window.
    pub fn malformed() -> Self {
        Self {
            address: String::new(),
            start_time: 1,
            end_time: 1,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn start_time(&self) -> Timestamp {
        self.start_time
    }

    pub fn end_time(&self) -> Timestamp {
        self.end_time
    }

    pub fn is_open_ended(&self) -> bool {
        self.end_time == 0
    }

    /// True if `address` may act at `time_now` under this window.
    pub fn is_valid_for(&self, address: &str, time_now: Timestamp) -> bool {
        self.start_time <= time_now
            && (self.end_time == 0 || self.end_time >= time_now)
            && eq_ignore_case(&self.address, address)
    }

    /// True if some address can still act strictly after `time_now`.
    pub fn is_reachable_after(&self, time_now: Timestamp) -> bool {
        !self.address.is_empty() && (self.end_time == 0 || self.end_time > time_now)
    }

    pub fn to_value(&self) -> Value {
        Value::Array(vec![
            Value::from(self.address.as_str()),
            Value::from(self.start_time),
            Value::from(self.end_time),
        ])
    }

    /// Read `[address, start, end]`. Arrays shorter than three elements
    /// decode to [`EncumbranceDetail::malformed`].
    pub fn from_legacy(array: &LegacyArray<'_>) -> Result<Self, CodecError> {
        if array.len() < 3 {
            return Ok(Self::malformed());
        }
        let address = array.opt_string(0)?.unwrap_or_default();
        let start = array.opt_i64(1)?.unwrap_or(0);
        let end = array.opt_i64(2)?.unwrap_or(0);
        Ok(Self::new(address, start, end))
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        packer.pack_str(&self.address)?;
        packer.pack_i64(self.start_time)?;
        packer.pack_i64(self.end_time)
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            address: unpacker.unpack_string()?,
            start_time: unpacker.unpack_i64()?,
            end_time: unpacker.unpack_i64()?,
        })
    }
}

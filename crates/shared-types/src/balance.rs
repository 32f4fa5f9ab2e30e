//! # Balance
//!
//! Arbitrary precision signed integer used for every money-like quantity.
//!
//! ## Wire form
//!
//! - Values that fit in `i64` are written as a plain MessagePack integer.
//! - Anything larger is written as ext type [`BIGINT_EXT_TYPE`] holding the
//!   minimal big-endian two's-complement bytes.
//!
//! Both the packed and the legacy forms follow this rule, so a balance never
//! has two encodings.

use crate::codec::{Packer, Unpacker};
use crate::errors::CodecError;
use num_bigint::BigInt;
use num_traits::{Signed, ToPrimitive, Zero};
use rmp::Marker;
use rmpv::Value;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};
use std::str::FromStr;

/// MessagePack ext type carrying balances outside the `i64` range.
pub const BIGINT_EXT_TYPE: i8 = 0x02;

#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Balance(BigInt);

impl Balance {
    pub fn zero() -> Self {
        Balance(BigInt::zero())
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_positive(&self) -> bool {
        self.0.is_positive()
    }

    pub fn is_negative(&self) -> bool {
        self.0.is_negative()
    }

    pub fn abs(&self) -> Balance {
        Balance(self.0.abs())
    }

    /// `max(self, 0)`.
    pub fn clamp_non_negative(&self) -> Balance {
        if self.is_negative() {
            Balance::zero()
        } else {
            self.clone()
        }
    }

    pub fn to_i64(&self) -> Option<i64> {
        self.0.to_i64()
    }

    pub fn as_bigint(&self) -> &BigInt {
        &self.0
    }

    pub fn pack(&self, packer: &mut Packer) -> Result<(), CodecError> {
        match self.to_i64() {
            Some(v) => packer.pack_i64(v),
            None => packer.pack_ext(BIGINT_EXT_TYPE, &self.0.to_signed_bytes_be()),
        }
    }

    pub fn unpack(unpacker: &mut Unpacker<'_>) -> Result<Balance, CodecError> {
        match unpacker.peek_marker()? {
            Marker::FixExt1
            | Marker::FixExt2
            | Marker::FixExt4
            | Marker::FixExt8
            | Marker::FixExt16
            | Marker::Ext8
            | Marker::Ext16
            | Marker::Ext32 => {
                let (type_id, payload) = unpacker.unpack_ext()?;
                Self::from_ext(type_id, payload)
            }
            _ => unpacker.unpack_i64().map(Balance::from),
        }
    }

    /// Legacy array element for this balance.
    pub fn to_value(&self) -> Value {
        match self.to_i64() {
            Some(v) => Value::from(v),
            None => Value::Ext(BIGINT_EXT_TYPE, self.0.to_signed_bytes_be()),
        }
    }

    /// Read a balance from a legacy array element.
    ///
    /// Accepts integers, the big-integer ext and decimal strings. Nil reads
    /// as zero.
    pub fn from_value(value: &Value) -> Result<Balance, CodecError> {
        match value {
            Value::Nil => Ok(Balance::zero()),
            Value::Integer(i) => {
                if let Some(v) = i.as_i64() {
                    Ok(Balance::from(v))
                } else if let Some(v) = i.as_u64() {
                    Ok(Balance::from(v))
                } else {
                    Err(CodecError::Malformed(format!("integer {i} out of range")))
                }
            }
            Value::Ext(type_id, payload) => Self::from_ext(*type_id, payload),
            Value::String(s) => {
                let s = s.as_str().ok_or(CodecError::InvalidUtf8)?;
                s.parse()
                    .map_err(|_| CodecError::Malformed(format!("'{s}' is not a balance")))
            }
            other => Err(CodecError::UnexpectedType {
                expected: "balance",
                found: crate::codec::legacy::value_kind(other),
            }),
        }
    }

    fn from_ext(type_id: i8, payload: &[u8]) -> Result<Balance, CodecError> {
        if type_id != BIGINT_EXT_TYPE {
            return Err(CodecError::UnknownCode {
                what: "ext type",
                code: i64::from(type_id),
            });
        }
        if payload.is_empty() {
            return Err(CodecError::Malformed("empty big integer payload".into()));
        }
        Ok(Balance(BigInt::from_signed_bytes_be(payload)))
    }
}

impl From<i64> for Balance {
    fn from(v: i64) -> Self {
        Balance(BigInt::from(v))
    }
}

impl From<i32> for Balance {
    fn from(v: i32) -> Self {
        Balance(BigInt::from(v))
    }
}

impl From<u64> for Balance {
    fn from(v: u64) -> Self {
        Balance(BigInt::from(v))
    }
}

impl From<BigInt> for Balance {
    fn from(v: BigInt) -> Self {
        Balance(v)
    }
}

impl FromStr for Balance {
    type Err = num_bigint::ParseBigIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BigInt::from_str(s.trim()).map(Balance)
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl Add for Balance {
    type Output = Balance;

    fn add(self, rhs: Balance) -> Balance {
        Balance(self.0 + rhs.0)
    }
}

impl<'a> Add<&'a Balance> for &'a Balance {
    type Output = Balance;

    fn add(self, rhs: &'a Balance) -> Balance {
        Balance(&self.0 + &rhs.0)
    }
}

impl Sub for Balance {
    type Output = Balance;

    fn sub(self, rhs: Balance) -> Balance {
        Balance(self.0 - rhs.0)
    }
}

impl<'a> Sub<&'a Balance> for &'a Balance {
    type Output = Balance;

    fn sub(self, rhs: &'a Balance) -> Balance {
        Balance(&self.0 - &rhs.0)
    }
}

impl AddAssign<&Balance> for Balance {
    fn add_assign(&mut self, rhs: &Balance) {
        self.0 += &rhs.0;
    }
}

impl SubAssign<&Balance> for Balance {
    fn sub_assign(&mut self, rhs: &Balance) {
        self.0 -= &rhs.0;
    }
}

impl Neg for Balance {
    type Output = Balance;

    fn neg(self) -> Balance {
        Balance(-self.0)
    }
}

impl std::iter::Sum for Balance {
    fn sum<I: Iterator<Item = Balance>>(iter: I) -> Balance {
        iter.fold(Balance::zero(), |acc, b| acc + b)
    }
}

impl<'a> std::iter::Sum<&'a Balance> for Balance {
    fn sum<I: Iterator<Item = &'a Balance>>(iter: I) -> Balance {
        iter.fold(Balance::zero(), |mut acc, b| {
            acc += b;
            acc
        })
    }
}

// JSON carries balances as decimal strings so no precision is lost.
impl Serialize for Balance {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

struct BalanceVisitor;

impl<'de> Visitor<'de> for BalanceVisitor {
    type Value = Balance;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("an integer or a decimal string")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Balance, E> {
        Ok(Balance::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Balance, E> {
        Ok(Balance::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Balance, E> {
        v.parse().map_err(E::custom)
    }
}

impl<'de> Deserialize<'de> for Balance {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(BalanceVisitor)
    }
}

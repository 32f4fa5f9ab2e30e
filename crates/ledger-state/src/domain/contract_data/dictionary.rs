//! Typed access to contract dictionaries.
//!
//! A contract is stored as a string-keyed dictionary. Each contract kind
//! lifts the keys it understands into typed fields through [`DictReader`]
//! and keeps every other key verbatim, so re-encoding never loses data.

use super::nominate_asset::NominateAsset;
use shared_types::codec::legacy::value_kind;
use shared_types::codec::{map_value, value_str};
use shared_types::{Balance, CodecError, Timestamp, Value};
use std::collections::BTreeMap;

/// Dictionary form of a contract, always iterated in key order.
pub type ContractDictionary = BTreeMap<String, Value>;

pub const FUNCTION: &str = "__function";
pub const ADDRESS: &str = "__address";
pub const TIME_EVENT: &str = "__timeevent";
pub const STATUS: &str = "__status";
pub const COMPLETED: &str = "__completed";
pub const CANCEL_TIME: &str = "__canceltime";
pub const CONTRACT_FUNCTION: &str = "contractfunction";
pub const ISSUING_ADDRESS: &str = "issuingaddress";
pub const START_DATE: &str = "startdate";
pub const EXPIRY: &str = "expiry";
pub const AUTO_SIGN: &str = "autosign";
pub const PROTOCOL: &str = "protocol";
pub const METADATA: &str = "metadata";
pub const ASSETS_IN: &str = "assetsin";
pub const ASSETS_OUT: &str = "assetsout";
pub const MIN_BLOCKS: &str = "minblocks";
pub const MAX_BLOCKS: &str = "maxblocks";
pub const NAMESPACE: &str = "namespace";
pub const INPUT_TOKEN_CLASS: &str = "inputtokenclass";
pub const OUTPUT_TOKEN_CLASS: &str = "outputtokenclass";
pub const BLOCK_SIZE_IN: &str = "blocksizein";
pub const BLOCK_SIZE_OUT: &str = "blocksizeout";
pub const CONTRACT_ADDRESS: &str = "contractaddress";
pub const ASSET_CLASS: &str = "assetclass";
pub const TO_ADDRESS: &str = "toaddr";
pub const CANCEL: &str = "cancel";
pub const PARTY: &str = "party";

/// Read a legacy map value into a dictionary.
pub fn dictionary_from_value(value: &Value) -> Result<ContractDictionary, CodecError> {
    match value {
        Value::Map(pairs) => pairs
            .iter()
            .map(|(k, v)| -> Result<(String, Value), CodecError> {
                Ok((value_str(k)?.to_string(), v.clone()))
            })
            .collect(),
        Value::Nil => Ok(ContractDictionary::new()),
        other => Err(CodecError::UnexpectedType {
            expected: "map",
            found: value_kind(other),
        }),
    }
}

pub fn dictionary_to_value(dict: &ContractDictionary) -> Value {
    map_value(dict.iter().map(|(k, v)| (k.clone(), v.clone())))
}

/// Consumes a dictionary key by key. Whatever is left over is returned by
/// [`DictReader::into_rest`].
pub(crate) struct DictReader {
    dict: ContractDictionary,
}

impl DictReader {
    pub(crate) fn new(dict: ContractDictionary) -> Self {
        Self { dict }
    }

    /// Remove `key`; a nil value reads as absent.
    pub(crate) fn take(&mut self, key: &str) -> Option<Value> {
        self.dict.remove(key).filter(|v| !v.is_nil())
    }

    pub(crate) fn take_string(&mut self, key: &str) -> Result<Option<String>, CodecError> {
        self.take(key)
            .map(|v| value_str(&v).map(str::to_owned))
            .transpose()
    }

    pub(crate) fn take_i64(&mut self, key: &str) -> Result<Option<i64>, CodecError> {
        self.take(key)
            .map(|v| {
                v.as_i64().ok_or_else(|| CodecError::UnexpectedType {
                    expected: "i64",
                    found: value_kind(&v),
                })
            })
            .transpose()
    }

    /// Booleans may also arrive as integers, non-zero meaning true.
    pub(crate) fn take_bool(&mut self, key: &str) -> Result<Option<bool>, CodecError> {
        match self.take(key) {
            None => Ok(None),
            Some(Value::Boolean(b)) => Ok(Some(b)),
            Some(v) => match v.as_i64() {
                Some(i) => Ok(Some(i != 0)),
                None => Err(CodecError::UnexpectedType {
                    expected: "bool",
                    found: value_kind(&v),
                }),
            },
        }
    }

    pub(crate) fn take_balance(&mut self, key: &str) -> Result<Option<Balance>, CodecError> {
        self.take(key).map(|v| Balance::from_value(&v)).transpose()
    }

    pub(crate) fn take_assets(&mut self, key: &str) -> Result<Option<Vec<NominateAsset>>, CodecError> {
        self.take(key)
            .map(|v| NominateAsset::list_from_value(&v))
            .transpose()
    }

    pub(crate) fn into_rest(self) -> ContractDictionary {
        self.dict
    }
}

/// Builds a dictionary; optional fields are skipped when absent.
pub(crate) struct DictWriter {
    dict: ContractDictionary,
}

impl DictWriter {
    /// Start from the keys a contract kept verbatim.
    pub(crate) fn with_rest(rest: &ContractDictionary) -> Self {
        Self { dict: rest.clone() }
    }

    pub(crate) fn put(&mut self, key: &str, value: Value) -> &mut Self {
        self.dict.insert(key.to_string(), value);
        self
    }

    pub(crate) fn put_str(&mut self, key: &str, value: &str) -> &mut Self {
        self.put(key, Value::from(value))
    }

    pub(crate) fn put_opt_str(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(v) = value {
            self.put_str(key, v);
        }
        self
    }

    pub(crate) fn put_assets(&mut self, key: &str, assets: Option<&[NominateAsset]>) -> &mut Self {
        if let Some(list) = assets {
            self.put(key, NominateAsset::list_to_value(list));
        }
        self
    }

    pub(crate) fn finish(&mut self) -> ContractDictionary {
        std::mem::take(&mut self.dict)
    }
}

/// Fields common to contracts created by a new-contract transaction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ContractHeader {
    pub address: String,
    pub time_event: Timestamp,
    /// Written only when non-empty.
    pub status: Option<String>,
    pub issuing_address: String,
    pub start_date: Option<Timestamp>,
    pub expiry: Option<Timestamp>,
    pub auto_sign: bool,
    pub protocol: Option<String>,
    pub metadata: Option<String>,
}

impl ContractHeader {
    pub(crate) fn read(reader: &mut DictReader) -> Result<Self, CodecError> {
        Ok(Self {
            address: reader.take_string(ADDRESS)?.unwrap_or_default(),
            time_event: reader.take_i64(TIME_EVENT)?.unwrap_or(0),
            status: reader.take_string(STATUS)?.filter(|s| !s.is_empty()),
            issuing_address: reader.take_string(ISSUING_ADDRESS)?.unwrap_or_default(),
            start_date: reader.take_i64(START_DATE)?,
            expiry: reader.take_i64(EXPIRY)?,
            auto_sign: reader.take_bool(AUTO_SIGN)?.unwrap_or(true),
            protocol: reader.take_string(PROTOCOL)?,
            metadata: reader.take_string(METADATA)?,
        })
    }

    /// `with_start_date` is false for kinds that never carry a start date.
    pub(crate) fn write(&self, writer: &mut DictWriter, with_start_date: bool) {
        writer
            .put_str(ADDRESS, &self.address)
            .put(TIME_EVENT, Value::from(self.time_event))
            .put_str(ISSUING_ADDRESS, &self.issuing_address)
            .put(EXPIRY, opt_i64_value(self.expiry))
            .put_opt_str(STATUS, self.status.as_deref().filter(|s| !s.is_empty()))
            .put_opt_str(PROTOCOL, self.protocol.as_deref())
            .put_opt_str(METADATA, self.metadata.as_deref());
        if with_start_date {
            writer.put(START_DATE, opt_i64_value(self.start_date));
        }
        if !self.auto_sign {
            writer.put(AUTO_SIGN, Value::Boolean(false));
        }
    }
}

fn opt_i64_value(value: Option<i64>) -> Value {
    value.map(Value::from).unwrap_or(Value::Nil)
}

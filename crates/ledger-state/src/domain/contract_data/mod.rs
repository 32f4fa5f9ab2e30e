//! # Contract Data
//!
//! The dictionary stored in a contract entry, lifted into one variant per
//! contract kind.
//!
//! ## Dispatch
//!
//! The `__function` key selects the kind. Dictionaries written before that
//! key existed may carry `contractfunction` instead. A dictionary with
//! neither stays [`ContractData::Raw`]; an unrecognised function name is a
//! decode error.
//!
//! Keys a kind does not model are kept in its `extra` dictionary and written
//! back unchanged, so every variant re-encodes to the same sorted map.

pub mod dictionary;
pub mod dvp;
pub mod exchange;
pub mod nominate;
pub mod nominate_asset;

pub use dictionary::{dictionary_from_value, dictionary_to_value, ContractDictionary, ContractHeader};
pub use dvp::{DvpUkCommit, DvpUkContract, DVP_UK, DVP_UK_COMMIT};
pub use exchange::{ExchangeCommit, ExchangeContract, EXCHANGE, EXCHANGE_COMMIT};
pub use nominate::{NominateCommit, TokensNominateContract, NOMINATE, TOKENS_NOMINATE};
pub use nominate_asset::NominateAsset;

use dictionary::{DictReader, ADDRESS, CONTRACT_ADDRESS, CONTRACT_FUNCTION, FUNCTION};
use shared_types::{CodecError, Value};

/// Typed view of a contract dictionary.
#[derive(Clone, Debug, PartialEq)]
pub enum ContractData {
    DvpUk(DvpUkContract),
    DvpUkCommit(DvpUkCommit),
    Exchange(ExchangeContract),
    ExchangeCommit(ExchangeCommit),
    TokensNominate(TokensNominateContract),
    NominateCommit(NominateCommit),
    /// A dictionary without a function name.
    Raw(ContractDictionary),
}

impl Default for ContractData {
    fn default() -> Self {
        ContractData::Raw(ContractDictionary::new())
    }
}

impl ContractData {
    pub fn from_dictionary(dict: ContractDictionary) -> Result<Self, CodecError> {
        let mut reader = DictReader::new(dict);
        let function = match reader.take_string(FUNCTION)? {
            Some(f) => Some(f),
            None => reader.take_string(CONTRACT_FUNCTION)?,
        };
        let Some(function) = function else {
            return Ok(ContractData::Raw(reader.into_rest()));
        };

        let data = match function.as_str() {
            DVP_UK => ContractData::DvpUk(DvpUkContract::read(reader)?),
            DVP_UK_COMMIT => ContractData::DvpUkCommit(DvpUkCommit::read(reader)?),
            EXCHANGE => ContractData::Exchange(ExchangeContract::read(reader)?),
            EXCHANGE_COMMIT => ContractData::ExchangeCommit(ExchangeCommit::read(reader)?),
            TOKENS_NOMINATE => ContractData::TokensNominate(TokensNominateContract::read(reader)?),
            NOMINATE => ContractData::NominateCommit(NominateCommit::read(reader)?),
            _ => return Err(CodecError::UnknownContractFunction(function)),
        };
        Ok(data)
    }

    pub fn from_value(value: &Value) -> Result<Self, CodecError> {
        Self::from_dictionary(dictionary_from_value(value)?)
    }

    /// Function name of this contract kind, `None` for raw dictionaries.
    pub fn function(&self) -> Option<&'static str> {
        match self {
            ContractData::DvpUk(_) => Some(DVP_UK),
            ContractData::DvpUkCommit(_) => Some(DVP_UK_COMMIT),
            ContractData::Exchange(_) => Some(EXCHANGE),
            ContractData::ExchangeCommit(_) => Some(EXCHANGE_COMMIT),
            ContractData::TokensNominate(_) => Some(TOKENS_NOMINATE),
            ContractData::NominateCommit(_) => Some(NOMINATE),
            ContractData::Raw(_) => None,
        }
    }

    /// Address of the contract this data belongs to, where the kind records it.
    pub fn contract_address(&self) -> Option<&str> {
        match self {
            ContractData::DvpUk(c) => Some(c.header.address.as_str()),
            ContractData::Exchange(c) => Some(c.header.address.as_str()),
            ContractData::TokensNominate(c) => Some(c.header.address.as_str()),
            ContractData::ExchangeCommit(c) => c.contract_address.as_deref(),
            ContractData::NominateCommit(c) => c.contract_address.as_deref(),
            ContractData::DvpUkCommit(_) => None,
            ContractData::Raw(dict) => dict
                .get(ADDRESS)
                .or_else(|| dict.get(CONTRACT_ADDRESS))
                .and_then(Value::as_str),
        }
    }

    pub fn to_dictionary(&self) -> ContractDictionary {
        match self {
            ContractData::DvpUk(c) => c.to_dictionary(),
            ContractData::DvpUkCommit(c) => c.to_dictionary(),
            ContractData::Exchange(c) => c.to_dictionary(),
            ContractData::ExchangeCommit(c) => c.to_dictionary(),
            ContractData::TokensNominate(c) => c.to_dictionary(),
            ContractData::NominateCommit(c) => c.to_dictionary(),
            ContractData::Raw(dict) => dict.clone(),
        }
    }

    /// Key-sorted map value of this contract.
    pub fn to_value(&self) -> Value {
        dictionary_to_value(&self.to_dictionary())
    }
}

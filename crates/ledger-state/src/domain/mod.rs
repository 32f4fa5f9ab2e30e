pub mod config;
pub mod contract_data;
pub mod encumbrance;
pub mod entries;
pub mod errors;

pub use config::*;
pub use contract_data::{ContractData, ContractDictionary, ContractHeader, NominateAsset};
pub use encumbrance::{
    AddressEncumbrances, AssetEncumbrances, EncumbranceDetail, EncumbranceEntry, DEFAULT_PRIORITY,
    HIGH_PRIORITY,
};
pub use entries::{
    AddressEntry, ContractEntry, LockType, LockedAsset, NamespaceAsset, NamespaceEntry, Nonces,
    PoaDetail, PoaEntry, PoaHeader, PoaItem, SignNodeEntry, XChainDetails,
    AP_DEFAULT_AUTHORISE_BY_ADDRESS, AP_TX_LIST,
};
pub use errors::*;

use shared_types::CodecError;
use thiserror::Error;

/// Errors surfaced by the entry store and entry conversions.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Entry not found: {key}")]
    EntryNotFound { key: String },

    #[error("Lock poisoned")]
    LockPoisoned,

    #[error("Invalid entry: {0}")]
    InvalidEntry(String),
}

/// Internal failures of an encumbrance mutation.
///
/// These never escape `AddressEncumbrances::set_encumbrance_entry`; they are
/// logged there and reported as a rejected mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncumbranceError {
    #[error("Asset {asset_id} would hold {count} encumbrances (max {max})")]
    TooManyEntries {
        asset_id: String,
        count: usize,
        max: usize,
    },

    #[error("Encumbrance total for {asset_id} became negative")]
    NegativeTotal { asset_id: String },
}

//! # Error Types
//!
//! Failures raised while packing or unpacking state entries.

use thiserror::Error;

/// Errors produced by the canonical codec.
///
/// Every variant is terminal for the entry being decoded: an entry that
/// cannot be decoded exactly is never partially accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Version tag outside the range the entry type understands.
    #[error("Unrecognised {entry} encoding version: {version}")]
    UnrecognisedVersion { entry: &'static str, version: i64 },

    /// The next value on the wire is not of the required type.
    #[error("Unexpected type: expected {expected}, found {found}")]
    UnexpectedType { expected: &'static str, found: String },

    /// Input ended in the middle of a value.
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// A string field did not hold valid UTF-8.
    #[error("Invalid UTF-8 in string field")]
    InvalidUtf8,

    /// A length header exceeded the configured decode limit.
    #[error("{what} length {len} exceeds limit {max}")]
    LengthLimit {
        what: &'static str,
        len: usize,
        max: usize,
    },

    /// A legacy array was shorter than its mandatory shape.
    #[error("{entry}: missing field at position {index}")]
    MissingField { entry: &'static str, index: usize },

    /// Contract dictionary named a function with no known data layout.
    #[error("Unknown contract function: {0}")]
    UnknownContractFunction(String),

    /// An enumerated code had no matching variant.
    #[error("Unknown {what} code: {code}")]
    UnknownCode { what: &'static str, code: i64 },

    /// Bytes left over after a complete entry was decoded.
    #[error("Trailing bytes after {entry}: {remaining}")]
    TrailingBytes {
        entry: &'static str,
        remaining: usize,
    },

    /// The underlying writer failed.
    #[error("Write error: {0}")]
    Write(String),

    /// A value had the right type but an impossible content.
    #[error("Malformed value: {0}")]
    Malformed(String),
}

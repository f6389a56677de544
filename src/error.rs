//! Engine error types.

use soia_wire::WireError;
use thiserror::Error;

/// Errors raised while decoding binary or JSON input, or while parsing a
/// type descriptor.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: String,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid base64 in bytes value: {0}")]
    InvalidBase64(#[from] base64::DecodeError),

    #[error("invalid base16 in bytes value: {0}")]
    InvalidBase16(#[from] hex::FromHexError),

    #[error("timestamp value is not a number")]
    NonFiniteTimestamp,

    #[error("enum number {number} does not identify a {expected} variant")]
    WrongVariantKind {
        number: u64,
        expected: &'static str,
    },

    #[error("unknown record id: {0}")]
    UnknownRecord(String),

    #[error("invalid key extractor: {0:?}")]
    InvalidKeyExtractor(String),
}

/// Errors raised while registering records or service methods. These are
/// fatal: the registration is rolled back and nothing is partially wired.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("record {0} is already registered")]
    DuplicateRecord(String),

    #[error("record {record} does not belong to module {module}")]
    ModuleMismatch {
        record: String,
        module: &'static str,
    },

    #[error("duplicate field number {number} in {record}")]
    DuplicateFieldNumber { record: String, number: u32 },

    #[error("duplicate field name {name:?} in {record}")]
    DuplicateFieldName {
        record: String,
        name: &'static str,
    },

    #[error("field number {number} in {record} is reserved")]
    ReservedFieldNumber { record: String, number: u32 },

    #[error("removed number {number} is an active field in {record}")]
    RemovedNumberActive { record: String, number: u32 },

    #[error("invalid key extractor: {0:?}")]
    InvalidKeyExtractor(String),
}

//! Carriers for unknown fields and variants preserved during decoding.

use bytes::Bytes;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Opaque identity of the serializer that captured an unknown payload.
/// Compared by pointer so that payloads cannot leak across record types.
#[derive(Clone)]
pub struct Token(Arc<()>);

impl Token {
    pub(crate) fn new() -> Self {
        Self(Arc::new(()))
    }
}

impl PartialEq for Token {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Token {}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token")
    }
}

/// Unknown trailing struct slots, kept in the form they arrived in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum FieldsPayload {
    /// Raw wire encoding of the unknown suffix; re-emitted byte for byte.
    Bytes(Bytes),
    /// Dense JSON values of the unknown suffix.
    Json(Vec<Value>),
}

/// Unknown trailing fields captured while decoding a struct in
/// keep-unrecognized mode. Generated structs store one of these in their
/// `_unrecognized` slot; it round-trips verbatim through the serializer
/// that captured it.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecognizedFields {
    pub(crate) token: Token,
    /// Total number of slots observed in the encoded struct.
    pub(crate) total_slots: usize,
    pub(crate) payload: FieldsPayload,
}

/// An unknown enum variant, kept in the form it arrived in.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum EnumPayload {
    /// Raw wire encoding of the whole enum element.
    Bytes(Bytes),
    /// Dense JSON value of the whole enum element.
    Json(Value),
}

/// An unknown enum variant captured while decoding in keep-unrecognized
/// mode. Generated enums carry one of these in their `Unrecognized`
/// variant.
#[derive(Debug, Clone, PartialEq)]
pub struct UnrecognizedEnum {
    pub(crate) token: Token,
    pub(crate) payload: EnumPayload,
}

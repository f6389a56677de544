//! # soia
//!
//! Runtime for records generated from soia schemas.
//!
//! This crate provides:
//! - One [`Serializer`] per type, converting values between dense JSON
//!   (number-indexed, rename-safe), readable JSON (name-indexed, for human
//!   inspection) and the binary form (a `soia`-magic-prefixed byte string
//!   using the variable-length wire grammar of `soia-wire`)
//! - Struct and enum serializers with forward/backward-compatible field
//!   numbering, removed-field handling and opt-in preservation of
//!   unrecognized fields
//! - The module registration protocol that generated code calls at startup
//! - Reflective [`TypeDescriptor`]s with a JSON round-trip and
//!   format-to-format transformation
//!
//! Serializers hold no per-call state: once registration is complete, any
//! number of threads may share them.

mod containers;
mod descriptor;
mod enums;
mod error;
mod json;
mod primitive;
mod registry;
mod serializer;
mod structs;
#[cfg(test)]
pub(crate) mod testing;
mod timestamp;
mod transform;
mod unrecognized;

pub use containers::{array_serializer, keyed_array_serializer, optional_serializer};
pub use descriptor::{
    parse_type_descriptor, FieldDescriptor, PrimitiveKind, RecordDescriptor, RecordKind,
    TypeDescriptor, TypeSignature,
};
pub use enums::EnumBuilder;
pub use error::{DecodeError, RegistrationError};
pub use json::JsonFlavor;
pub use primitive::{
    bool_serializer, bytes_serializer, float32_serializer, float64_serializer, int32_serializer,
    int64_serializer, string_serializer, timestamp_serializer, uint64_serializer,
};
pub use registry::{init_module, Record, RecordDef};
pub use serializer::{DecodeMode, Serializer};
pub use structs::StructBuilder;
pub use timestamp::Timestamp;
pub use transform::{Encoded, Format};
pub use unrecognized::{UnrecognizedEnum, UnrecognizedFields};

// The byte-string primitive type; immutable and sliceable without copying.
pub use bytes::Bytes;

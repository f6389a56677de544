//! The uniform serializer contract.

use crate::descriptor::{TypeDescriptor, TypeSignature};
use crate::error::DecodeError;
use crate::json::JsonFlavor;
use bytes::Bytes;
use serde_json::Value;
use soia_wire::{Reader, Writer, MAGIC};
use std::sync::Arc;

/// Whether a decoder drops or preserves fields and variants it does not
/// recognize. Preservation is intended for data from trusted sources only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    DropUnrecognized,
    KeepUnrecognized,
}

/// Internal per-type codec. Implementations hold no per-call state, so a
/// codec can be shared freely across threads.
pub(crate) trait Codec<T>: Send + Sync {
    fn encode(&self, value: &T, w: &mut Writer);
    fn decode(&self, r: &mut Reader<'_>) -> Result<T, DecodeError>;
    fn to_json(&self, value: &T, flavor: JsonFlavor) -> Value;
    fn from_json(&self, value: &Value, mode: DecodeMode) -> Result<T, DecodeError>;
    fn default_value(&self) -> T;
    fn is_default(&self, value: &T) -> bool;
    fn signature(&self) -> TypeSignature;
}

/// Converts values of `T` to and from dense JSON, readable JSON and the
/// binary form. Cheap to clone; safe to share across threads.
pub struct Serializer<T> {
    codec: Arc<dyn Codec<T>>,
}

impl<T> Clone for Serializer<T> {
    fn clone(&self) -> Self {
        Self {
            codec: self.codec.clone(),
        }
    }
}

impl<T> Serializer<T> {
    pub(crate) fn from_codec(codec: Arc<dyn Codec<T>>) -> Self {
        Self { codec }
    }

    pub(crate) fn codec(&self) -> &dyn Codec<T> {
        self.codec.as_ref()
    }

    /// Serializes `value` to the binary form, prefixed with the 4-byte
    /// `soia` magic.
    pub fn to_bytes(&self, value: &T) -> Bytes {
        let mut w = Writer::new();
        w.put_slice(&MAGIC);
        self.codec.encode(value, &mut w);
        w.freeze()
    }

    /// Deserializes the binary form, dropping unrecognized fields.
    pub fn from_bytes(&self, bytes: &[u8]) -> Result<T, DecodeError> {
        self.from_bytes_with(bytes, DecodeMode::DropUnrecognized)
    }

    /// Deserializes the binary form. The leading 4 bytes are skipped
    /// unconditionally.
    pub fn from_bytes_with(&self, bytes: &[u8], mode: DecodeMode) -> Result<T, DecodeError> {
        if bytes.len() < MAGIC.len() {
            return Err(soia_wire::WireError::UnexpectedEof {
                offset: bytes.len(),
            }
            .into());
        }
        let mut r = Reader::with_keep_unrecognized(
            &bytes[MAGIC.len()..],
            mode == DecodeMode::KeepUnrecognized,
        );
        self.codec.decode(&mut r)
    }

    pub fn to_json(&self, value: &T, flavor: JsonFlavor) -> Value {
        self.codec.to_json(value, flavor)
    }

    /// Stringified JSON: compact for the dense flavor, two-space indented
    /// for the readable flavor.
    pub fn to_json_code(&self, value: &T, flavor: JsonFlavor) -> String {
        let json = self.to_json(value, flavor);
        match flavor {
            JsonFlavor::Dense => json.to_string(),
            JsonFlavor::Readable => {
                serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
            }
        }
    }

    /// Deserializes either JSON flavor, dropping unrecognized fields.
    pub fn from_json(&self, value: &Value) -> Result<T, DecodeError> {
        self.from_json_with(value, DecodeMode::DropUnrecognized)
    }

    pub fn from_json_with(&self, value: &Value, mode: DecodeMode) -> Result<T, DecodeError> {
        self.codec.from_json(value, mode)
    }

    pub fn from_json_code(&self, code: &str) -> Result<T, DecodeError> {
        self.from_json_code_with(code, DecodeMode::DropUnrecognized)
    }

    pub fn from_json_code_with(&self, code: &str, mode: DecodeMode) -> Result<T, DecodeError> {
        let value: Value = serde_json::from_str(code)?;
        self.from_json_with(&value, mode)
    }

    pub fn default_value(&self) -> T {
        self.codec.default_value()
    }

    pub fn is_default(&self, value: &T) -> bool {
        self.codec.is_default(value)
    }

    /// The reflective descriptor mirroring this serializer's type, with the
    /// transitive closure of referenced record definitions.
    pub fn type_descriptor(&self) -> TypeDescriptor {
        TypeDescriptor::for_signature(self.codec.signature())
    }
}

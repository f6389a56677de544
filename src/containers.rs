//! Optional and array codecs.

use crate::descriptor::TypeSignature;
use crate::error::DecodeError;
use crate::json::{self, JsonFlavor};
use crate::serializer::{Codec, DecodeMode, Serializer};
use serde_json::Value;
use soia_wire::wire;
use soia_wire::{Reader, Writer};
use std::sync::Arc;

/// Wraps `inner` so that values may also be null. Optionality is idempotent
/// at the type-signature level: the descriptor of an optional-of-optional
/// collapses to a single optional.
pub fn optional_serializer<T: 'static>(inner: Serializer<T>) -> Serializer<Option<T>> {
    Serializer::from_codec(Arc::new(OptionalCodec { inner }))
}

/// Serializer for arrays of `item`.
pub fn array_serializer<T: 'static>(item: Serializer<T>) -> Serializer<Vec<T>> {
    Serializer::from_codec(Arc::new(ArrayCodec {
        item,
        key_extractor: None,
    }))
}

/// Serializer for arrays whose generated type supports indexed lookups by
/// the field named by `key_extractor` (a dotted lowercase path).
///
/// # Panics
///
/// Panics if `key_extractor` is not lexically valid. The string comes from
/// the schema compiler, so an invalid one is a generated-code bug.
pub fn keyed_array_serializer<T: 'static>(
    item: Serializer<T>,
    key_extractor: &str,
) -> Serializer<Vec<T>> {
    assert!(
        is_valid_key_extractor(key_extractor),
        "invalid key extractor: {key_extractor:?}"
    );
    Serializer::from_codec(Arc::new(ArrayCodec {
        item,
        key_extractor: Some(key_extractor.to_owned()),
    }))
}

/// Lexical check for key extractors:
/// `^[a-z_][a-z0-9_]*(\.[a-z_][a-z0-9_]*)*$`.
pub(crate) fn is_valid_key_extractor(path: &str) -> bool {
    !path.is_empty()
        && path.split('.').all(|segment| {
            let mut chars = segment.chars();
            matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        })
}

struct OptionalCodec<T> {
    inner: Serializer<T>,
}

impl<T: 'static> Codec<Option<T>> for OptionalCodec<T> {
    fn encode(&self, value: &Option<T>, w: &mut Writer) {
        match value {
            None => w.put_u8(wire::WIRE_NULL),
            Some(inner) => self.inner.codec().encode(inner, w),
        }
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<Option<T>, DecodeError> {
        if r.peek_u8()? == wire::WIRE_NULL {
            r.read_u8()?;
            return Ok(None);
        }
        Ok(Some(self.inner.codec().decode(r)?))
    }

    fn to_json(&self, value: &Option<T>, flavor: JsonFlavor) -> Value {
        match value {
            None => Value::Null,
            Some(inner) => self.inner.codec().to_json(inner, flavor),
        }
    }

    fn from_json(&self, value: &Value, mode: DecodeMode) -> Result<Option<T>, DecodeError> {
        match value {
            Value::Null => Ok(None),
            _ => Ok(Some(self.inner.codec().from_json(value, mode)?)),
        }
    }

    fn default_value(&self) -> Option<T> {
        None
    }

    fn is_default(&self, value: &Option<T>) -> bool {
        value.is_none()
    }

    fn signature(&self) -> TypeSignature {
        match self.inner.codec().signature() {
            // optional<optional<T>> is optional<T>
            sig @ TypeSignature::Optional(_) => sig,
            sig => TypeSignature::Optional(Box::new(sig)),
        }
    }
}

struct ArrayCodec<T> {
    item: Serializer<T>,
    key_extractor: Option<String>,
}

impl<T: 'static> Codec<Vec<T>> for ArrayCodec<T> {
    fn encode(&self, value: &Vec<T>, w: &mut Writer) {
        wire::encode_array_len(w, value.len());
        for item in value {
            self.item.codec().encode(item, w);
        }
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<Vec<T>, DecodeError> {
        let len = wire::decode_array_len(r)?;
        // Cap the preallocation so that a lying length prefix cannot balloon
        // memory before the reads start failing.
        let mut items = Vec::with_capacity(len.min(4096));
        for _ in 0..len {
            items.push(self.item.codec().decode(r)?);
        }
        Ok(items)
    }

    fn to_json(&self, value: &Vec<T>, flavor: JsonFlavor) -> Value {
        Value::Array(
            value
                .iter()
                .map(|item| self.item.codec().to_json(item, flavor))
                .collect(),
        )
    }

    fn from_json(&self, value: &Value, mode: DecodeMode) -> Result<Vec<T>, DecodeError> {
        match value {
            Value::Array(items) => items
                .iter()
                .map(|item| self.item.codec().from_json(item, mode))
                .collect(),
            _ if json::is_json_zero(value) => Ok(Vec::new()),
            _ => Err(json::type_mismatch("array", value)),
        }
    }

    fn default_value(&self) -> Vec<T> {
        Vec::new()
    }

    fn is_default(&self, value: &Vec<T>) -> bool {
        value.is_empty()
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Array {
            item: Box::new(self.item.codec().signature()),
            key_extractor: self.key_extractor.clone(),
        }
    }
}

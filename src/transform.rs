//! Reciprocal format transformation over type descriptors.
//!
//! A parsed or exported [`TypeDescriptor`] can re-encode data between dense
//! JSON, readable JSON and bytes without the generated types: the walkers
//! here interpret the descriptor graph directly, pivoting through dense
//! JSON. Trailing slots not described by the descriptor are carried
//! generically between bytes and dense JSON; readable output drops them.

use crate::descriptor::{
    PrimitiveKind, RecordDescriptor, RecordKind, TypeDescriptor, TypeSignature,
};
use crate::error::DecodeError;
use crate::json::{self, JsonFlavor};
use crate::primitive::{byte_string_from_json, byte_string_to_json, timestamp_from_json};
use crate::timestamp::Timestamp;
use bytes::Bytes;
use serde_json::{json, Map, Value};
use soia_wire::{wire, Reader, Writer, MAGIC};

/// One of the three external forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Bytes,
    DenseJson,
    ReadableJson,
}

/// A serialized value in either carrier. JSON input may be of either
/// flavor; the decoder tells them apart by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Encoded {
    Bytes(Bytes),
    Json(Value),
}

impl TypeDescriptor {
    /// Decodes `source` and re-encodes it as `target`, enabling lossless
    /// conversion between the dense forms (readable output is lossy by
    /// design: unknown slots and default fields are not rendered).
    pub fn transform(&self, source: &Encoded, target: Format) -> Result<Encoded, DecodeError> {
        let dense = match source {
            Encoded::Bytes(bytes) => {
                if bytes.len() < MAGIC.len() {
                    return Err(soia_wire::WireError::UnexpectedEof {
                        offset: bytes.len(),
                    }
                    .into());
                }
                let mut r = Reader::new(&bytes[MAGIC.len()..]);
                self.wire_to_dense(self.signature(), &mut r)?
            }
            Encoded::Json(value) => self.json_to_dense(self.signature(), value)?,
        };
        Ok(match target {
            Format::DenseJson => Encoded::Json(dense),
            Format::ReadableJson => Encoded::Json(self.dense_to_readable(self.signature(), &dense)?),
            Format::Bytes => {
                let mut w = Writer::new();
                w.put_slice(&MAGIC);
                self.dense_to_wire(self.signature(), &dense, &mut w)?;
                Encoded::Bytes(w.freeze())
            }
        })
    }

    fn lookup(&self, id: &str) -> Result<&RecordDescriptor, DecodeError> {
        self.record(id)
            .ok_or_else(|| DecodeError::UnknownRecord(id.to_owned()))
    }

    // -----------------------------------------------------------------------
    // bytes -> dense JSON
    // -----------------------------------------------------------------------

    fn wire_to_dense(
        &self,
        signature: &TypeSignature,
        r: &mut Reader<'_>,
    ) -> Result<Value, DecodeError> {
        match signature {
            TypeSignature::Primitive(kind) => primitive_wire_to_dense(*kind, r),
            TypeSignature::Optional(inner) => {
                if r.peek_u8()? == wire::WIRE_NULL {
                    r.read_u8()?;
                    Ok(Value::Null)
                } else {
                    self.wire_to_dense(inner, r)
                }
            }
            TypeSignature::Array { item, .. } => {
                let len = wire::decode_array_len(r)?;
                let mut items = Vec::with_capacity(len.min(4096));
                for _ in 0..len {
                    items.push(self.wire_to_dense(item, r)?);
                }
                Ok(Value::Array(items))
            }
            TypeSignature::Record(id) => {
                let record = self.lookup(id)?;
                match record.kind {
                    RecordKind::Struct => self.struct_wire_to_dense(record, r),
                    RecordKind::Enum => self.enum_wire_to_dense(record, r),
                }
            }
        }
    }

    fn struct_wire_to_dense(
        &self,
        record: &RecordDescriptor,
        r: &mut Reader<'_>,
    ) -> Result<Value, DecodeError> {
        let len = wire::decode_array_len(r)?;
        let recognized = record.recognized_slots();
        let mut slots = Vec::with_capacity(len.min(4096));
        for number in 0..len {
            let slot = match record
                .field_by_number(number as u32)
                .filter(|_| number < recognized)
            {
                Some(field) => match &field.signature {
                    Some(signature) => self.wire_to_dense(signature, r)?,
                    None => untyped_wire_to_dense(r)?,
                },
                // Removed numbers, gaps, and unknown trailing slots.
                None => untyped_wire_to_dense(r)?,
            };
            slots.push(slot);
        }
        Ok(Value::Array(slots))
    }

    fn enum_wire_to_dense(
        &self,
        record: &RecordDescriptor,
        r: &mut Reader<'_>,
    ) -> Result<Value, DecodeError> {
        let start = r.position();
        let wire_byte = r.peek_u8()?;
        if wire_byte < wire::WIRE_STRING_EMPTY {
            let number = wire::decode_numeric(r)?.to_i64();
            if let Some(field) = record.field_by_number(number.max(0) as u32) {
                if field.signature.is_some() {
                    return Err(DecodeError::WrongVariantKind {
                        number: number.max(0) as u64,
                        expected: "constant",
                    });
                }
            }
            return Ok(json::i64_to_json(number));
        }
        let number = match wire_byte {
            wire::WIRE_ENUM_VALUE => {
                r.read_u8()?;
                wire::decode_uint(r)?
            }
            wire::WIRE_ENUM_VALUE_1..=wire::WIRE_ENUM_VALUE_4 => {
                r.read_u8()?;
                (wire_byte - wire::WIRE_ENUM_VALUE_1 + 1) as u64
            }
            _ => {
                return Err(soia_wire::WireError::InvalidWire {
                    wire: wire_byte,
                    offset: start,
                }
                .into())
            }
        };
        let payload = match record.field_by_number(number as u32) {
            Some(field) => match &field.signature {
                Some(signature) => self.wire_to_dense(signature, r)?,
                None => {
                    return Err(DecodeError::WrongVariantKind {
                        number,
                        expected: "value",
                    })
                }
            },
            None => untyped_wire_to_dense(r)?,
        };
        Ok(json!([number, payload]))
    }

    // -----------------------------------------------------------------------
    // any JSON -> dense JSON
    // -----------------------------------------------------------------------

    fn json_to_dense(
        &self,
        signature: &TypeSignature,
        value: &Value,
    ) -> Result<Value, DecodeError> {
        match signature {
            TypeSignature::Primitive(kind) => primitive_json_to_dense(*kind, value),
            TypeSignature::Optional(inner) => match value {
                Value::Null => Ok(Value::Null),
                _ => self.json_to_dense(inner, value),
            },
            TypeSignature::Array { item, .. } => match value {
                Value::Array(items) => Ok(Value::Array(
                    items
                        .iter()
                        .map(|item_json| self.json_to_dense(item, item_json))
                        .collect::<Result<_, _>>()?,
                )),
                _ if json::is_json_zero(value) => Ok(Value::Array(Vec::new())),
                _ => Err(json::type_mismatch("array", value)),
            },
            TypeSignature::Record(id) => {
                let record = self.lookup(id)?;
                match record.kind {
                    RecordKind::Struct => self.struct_json_to_dense(record, value),
                    RecordKind::Enum => self.enum_json_to_dense(record, value),
                }
            }
        }
    }

    fn struct_json_to_dense(
        &self,
        record: &RecordDescriptor,
        value: &Value,
    ) -> Result<Value, DecodeError> {
        match value {
            Value::Array(items) => {
                let recognized = record.recognized_slots();
                let mut slots = Vec::with_capacity(items.len());
                for (number, item) in items.iter().enumerate() {
                    let slot = match record
                        .field_by_number(number as u32)
                        .filter(|_| number < recognized)
                        .and_then(|f| f.signature.as_ref())
                    {
                        Some(signature) if !json::is_json_zero(item) => {
                            self.json_to_dense(signature, item)?
                        }
                        _ => item.clone(),
                    };
                    slots.push(slot);
                }
                Ok(Value::Array(slots))
            }
            Value::Object(map) => {
                let mut written = 0usize;
                for field in &record.fields {
                    if map.contains_key(&field.name) {
                        written = written.max(field.number as usize + 1);
                    }
                }
                let mut slots = Vec::with_capacity(written);
                for number in 0..written {
                    let slot = match record.field_by_number(number as u32) {
                        Some(field) => match (map.get(&field.name), &field.signature) {
                            (Some(item), Some(signature)) => self.json_to_dense(signature, item)?,
                            _ => Value::from(0),
                        },
                        None => Value::from(0),
                    };
                    slots.push(slot);
                }
                Ok(Value::Array(slots))
            }
            _ if json::is_json_zero(value) => Ok(Value::Array(Vec::new())),
            _ => Err(json::type_mismatch("array or object", value)),
        }
    }

    fn enum_json_to_dense(
        &self,
        record: &RecordDescriptor,
        value: &Value,
    ) -> Result<Value, DecodeError> {
        match value {
            Value::Number(_) => Ok(value.clone()),
            Value::String(s) => {
                if s == "?" {
                    return Ok(Value::from(0));
                }
                if let Some(field) = record.fields.iter().find(|f| f.name == *s) {
                    return Ok(Value::from(field.number));
                }
                if let Ok(number) = s.parse::<i64>() {
                    return Ok(json::i64_to_json(number));
                }
                Ok(Value::from(0))
            }
            Value::Array(items) => {
                let number = match items.first() {
                    Some(first) => json::number_from_json(first)?.to_i64(),
                    None => return Err(json::type_mismatch("enum value", value)),
                };
                let payload = items.get(1).unwrap_or(&Value::Null);
                let dense_payload = match record
                    .field_by_number(number.max(0) as u32)
                    .and_then(|f| f.signature.as_ref())
                {
                    Some(signature) => self.json_to_dense(signature, payload)?,
                    None => payload.clone(),
                };
                Ok(json!([number, dense_payload]))
            }
            Value::Object(map) => {
                let kind = map
                    .get("kind")
                    .and_then(Value::as_str)
                    .ok_or_else(|| json::type_mismatch("enum object", value))?;
                let payload = map.get("value").unwrap_or(&Value::Null);
                match record.field_by_name(kind) {
                    Some(field) => match &field.signature {
                        Some(signature) => Ok(json!([
                            field.number,
                            self.json_to_dense(signature, payload)?
                        ])),
                        None => Ok(Value::from(field.number)),
                    },
                    None => Ok(Value::from(0)),
                }
            }
            _ => Err(json::type_mismatch("enum value", value)),
        }
    }

    // -----------------------------------------------------------------------
    // dense JSON -> readable JSON
    // -----------------------------------------------------------------------

    fn dense_to_readable(
        &self,
        signature: &TypeSignature,
        dense: &Value,
    ) -> Result<Value, DecodeError> {
        match signature {
            TypeSignature::Primitive(kind) => primitive_dense_to_readable(*kind, dense),
            TypeSignature::Optional(inner) => match dense {
                Value::Null => Ok(Value::Null),
                _ => self.dense_to_readable(inner, dense),
            },
            TypeSignature::Array { item, .. } => match dense {
                Value::Array(items) => Ok(Value::Array(
                    items
                        .iter()
                        .map(|item_json| self.dense_to_readable(item, item_json))
                        .collect::<Result<_, _>>()?,
                )),
                _ => Ok(Value::Array(Vec::new())),
            },
            TypeSignature::Record(id) => {
                let record = self.lookup(id)?;
                match record.kind {
                    RecordKind::Struct => self.struct_dense_to_readable(record, dense),
                    RecordKind::Enum => self.enum_dense_to_readable(record, dense),
                }
            }
        }
    }

    fn struct_dense_to_readable(
        &self,
        record: &RecordDescriptor,
        dense: &Value,
    ) -> Result<Value, DecodeError> {
        let items = match dense {
            Value::Array(items) => items.as_slice(),
            _ => &[],
        };
        let mut out = Map::new();
        for (number, item) in items.iter().enumerate() {
            // Zero slots are defaults; unknown slots are not rendered.
            if json::is_json_zero(item) {
                continue;
            }
            if let Some(field) = record.field_by_number(number as u32) {
                if let Some(signature) = &field.signature {
                    out.insert(field.name.clone(), self.dense_to_readable(signature, item)?);
                }
            }
        }
        Ok(Value::Object(out))
    }

    fn enum_dense_to_readable(
        &self,
        record: &RecordDescriptor,
        dense: &Value,
    ) -> Result<Value, DecodeError> {
        match dense {
            Value::Number(_) => {
                let number = json::number_from_json(dense)?.to_i64();
                match record
                    .field_by_number(number.max(0) as u32)
                    .filter(|f| f.signature.is_none() && number > 0)
                {
                    Some(field) => Ok(Value::String(field.name.clone())),
                    None => Ok(Value::String("?".to_owned())),
                }
            }
            Value::Array(items) => {
                let number = match items.first() {
                    Some(first) => json::number_from_json(first)?.to_i64(),
                    None => return Err(json::type_mismatch("enum value", dense)),
                };
                let payload = items.get(1).unwrap_or(&Value::Null);
                match record
                    .field_by_number(number.max(0) as u32)
                    .and_then(|f| f.signature.as_ref().map(|s| (f, s)))
                {
                    Some((field, signature)) => Ok(json!({
                        "kind": field.name.clone(),
                        "value": self.dense_to_readable(signature, payload)?,
                    })),
                    None => Ok(Value::String("?".to_owned())),
                }
            }
            _ => Err(json::type_mismatch("enum value", dense)),
        }
    }

    // -----------------------------------------------------------------------
    // dense JSON -> bytes
    // -----------------------------------------------------------------------

    fn dense_to_wire(
        &self,
        signature: &TypeSignature,
        dense: &Value,
        w: &mut Writer,
    ) -> Result<(), DecodeError> {
        match signature {
            TypeSignature::Primitive(kind) => primitive_dense_to_wire(*kind, dense, w),
            TypeSignature::Optional(inner) => match dense {
                Value::Null => {
                    w.put_u8(wire::WIRE_NULL);
                    Ok(())
                }
                _ => self.dense_to_wire(inner, dense, w),
            },
            TypeSignature::Array { item, .. } => match dense {
                Value::Array(items) => {
                    wire::encode_array_len(w, items.len());
                    for item_json in items {
                        self.dense_to_wire(item, item_json, w)?;
                    }
                    Ok(())
                }
                _ => {
                    wire::encode_array_len(w, 0);
                    Ok(())
                }
            },
            TypeSignature::Record(id) => {
                let record = self.lookup(id)?;
                match record.kind {
                    RecordKind::Struct => self.struct_dense_to_wire(record, dense, w),
                    RecordKind::Enum => self.enum_dense_to_wire(record, dense, w),
                }
            }
        }
    }

    fn struct_dense_to_wire(
        &self,
        record: &RecordDescriptor,
        dense: &Value,
        w: &mut Writer,
    ) -> Result<(), DecodeError> {
        let items = match dense {
            Value::Array(items) => items.as_slice(),
            _ => &[],
        };
        wire::encode_struct_len(w, items.len());
        let recognized = record.recognized_slots();
        for (number, item) in items.iter().enumerate() {
            match record
                .field_by_number(number as u32)
                .filter(|_| number < recognized)
                .and_then(|f| f.signature.as_ref())
            {
                Some(signature) if !json::is_json_zero(item) => {
                    self.dense_to_wire(signature, item, w)?
                }
                _ => untyped_dense_to_wire(item, w)?,
            }
        }
        Ok(())
    }

    fn enum_dense_to_wire(
        &self,
        record: &RecordDescriptor,
        dense: &Value,
        w: &mut Writer,
    ) -> Result<(), DecodeError> {
        match dense {
            Value::Number(_) | Value::String(_) => {
                let number = json::number_from_json(dense)?.to_u64();
                wire::encode_uint(w, number);
                Ok(())
            }
            Value::Array(items) => {
                let number = match items.first() {
                    Some(first) => json::number_from_json(first)?.to_u64(),
                    None => return Err(json::type_mismatch("enum value", dense)),
                };
                let payload = items.get(1).unwrap_or(&Value::Null);
                if (1..=4).contains(&number) {
                    w.put_u8(wire::WIRE_ENUM_VALUE_1 + (number - 1) as u8);
                } else {
                    w.put_u8(wire::WIRE_ENUM_VALUE);
                    wire::encode_uint(w, number);
                }
                match record
                    .field_by_number(number as u32)
                    .and_then(|f| f.signature.as_ref())
                {
                    Some(signature) => self.dense_to_wire(signature, payload, w),
                    None => untyped_dense_to_wire(payload, w),
                }
            }
            _ => Err(json::type_mismatch("enum value", dense)),
        }
    }
}

// ---------------------------------------------------------------------------
// Primitive walkers
// ---------------------------------------------------------------------------

fn primitive_wire_to_dense(
    kind: PrimitiveKind,
    r: &mut Reader<'_>,
) -> Result<Value, DecodeError> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::from(wire::decode_bool(r)? as i32),
        PrimitiveKind::Int32 => Value::from(wire::decode_i32(r)?),
        PrimitiveKind::Int64 => json::i64_to_json(wire::decode_i64(r)?),
        PrimitiveKind::Uint64 => json::u64_to_json(wire::decode_u64(r)?),
        PrimitiveKind::Float32 => json::float_to_json(wire::decode_f32(r)? as f64),
        PrimitiveKind::Float64 => json::float_to_json(wire::decode_f64(r)?),
        PrimitiveKind::Timestamp => Value::from(
            Timestamp::from_unix_millis(wire::decode_timestamp_millis(r)?).unix_millis(),
        ),
        PrimitiveKind::String => Value::String(wire::decode_string(r)?),
        PrimitiveKind::Bytes => {
            byte_string_to_json(&wire::decode_byte_string(r)?, JsonFlavor::Dense)
        }
    })
}

fn primitive_json_to_dense(kind: PrimitiveKind, value: &Value) -> Result<Value, DecodeError> {
    Ok(match kind {
        PrimitiveKind::Bool => match value {
            Value::Bool(b) => Value::from(*b as i32),
            _ => Value::from(json::number_from_json(value)?.truthy() as i32),
        },
        PrimitiveKind::Int32 => Value::from(json::number_from_json(value)?.to_i32()),
        PrimitiveKind::Int64 => json::i64_to_json(json::number_from_json(value)?.to_i64()),
        PrimitiveKind::Uint64 => json::u64_to_json(json::number_from_json(value)?.to_u64()),
        PrimitiveKind::Float32 => json::float_to_json(json::float_from_json(value)? as f32 as f64),
        PrimitiveKind::Float64 => json::float_to_json(json::float_from_json(value)?),
        PrimitiveKind::Timestamp => Value::from(timestamp_from_json(value)?.unix_millis()),
        PrimitiveKind::String => match value {
            Value::String(_) => value.clone(),
            _ if json::is_json_zero(value) => Value::String(String::new()),
            _ => return Err(json::type_mismatch("string", value)),
        },
        PrimitiveKind::Bytes => {
            byte_string_to_json(&byte_string_from_json(value)?, JsonFlavor::Dense)
        }
    })
}

fn primitive_dense_to_readable(kind: PrimitiveKind, dense: &Value) -> Result<Value, DecodeError> {
    Ok(match kind {
        PrimitiveKind::Bool => Value::Bool(json::number_from_json(dense)?.truthy()),
        PrimitiveKind::Timestamp => {
            let ts = timestamp_from_json(dense)?;
            json!({"unix_millis": ts.unix_millis(), "formatted": ts.format_iso()})
        }
        PrimitiveKind::Bytes => {
            byte_string_to_json(&byte_string_from_json(dense)?, JsonFlavor::Readable)
        }
        PrimitiveKind::String if json::is_json_zero(dense) => Value::String(String::new()),
        _ => dense.clone(),
    })
}

fn primitive_dense_to_wire(
    kind: PrimitiveKind,
    dense: &Value,
    w: &mut Writer,
) -> Result<(), DecodeError> {
    match kind {
        PrimitiveKind::Bool => wire::encode_bool(w, json::number_from_json(dense)?.truthy()),
        PrimitiveKind::Int32 => wire::encode_i32(w, json::number_from_json(dense)?.to_i32()),
        PrimitiveKind::Int64 => wire::encode_i64(w, json::number_from_json(dense)?.to_i64()),
        PrimitiveKind::Uint64 => wire::encode_uint(w, json::number_from_json(dense)?.to_u64()),
        PrimitiveKind::Float32 => wire::encode_f32(w, json::float_from_json(dense)? as f32),
        PrimitiveKind::Float64 => wire::encode_f64(w, json::float_from_json(dense)?),
        PrimitiveKind::Timestamp => {
            wire::encode_timestamp_millis(w, timestamp_from_json(dense)?.unix_millis())
        }
        PrimitiveKind::String => match dense {
            Value::String(s) => wire::encode_string(w, s),
            _ if json::is_json_zero(dense) => w.put_u8(0),
            _ => return Err(json::type_mismatch("string", dense)),
        },
        PrimitiveKind::Bytes => wire::encode_byte_string(w, &byte_string_from_json(dense)?),
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Untyped walkers, for slots the descriptor does not describe
// ---------------------------------------------------------------------------

/// Decodes one wire element of unknown type into its generic dense JSON
/// projection.
fn untyped_wire_to_dense(r: &mut Reader<'_>) -> Result<Value, DecodeError> {
    let wire_byte = r.peek_u8()?;
    match wire_byte {
        wire::WIRE_NULL => {
            r.read_u8()?;
            Ok(Value::Null)
        }
        wire::WIRE_STRING_EMPTY | wire::WIRE_STRING => Ok(Value::String(wire::decode_string(r)?)),
        wire::WIRE_BYTES_EMPTY | wire::WIRE_BYTES => Ok(byte_string_to_json(
            &wire::decode_byte_string(r)?,
            JsonFlavor::Dense,
        )),
        wire::WIRE_LEN_0 | wire::WIRE_LEN_1 | wire::WIRE_LEN_2 | wire::WIRE_LEN_N => {
            let len = wire::decode_array_len(r)?;
            let mut items = Vec::with_capacity(len.min(4096));
            for _ in 0..len {
                items.push(untyped_wire_to_dense(r)?);
            }
            Ok(Value::Array(items))
        }
        wire::WIRE_ENUM_VALUE => {
            r.read_u8()?;
            let number = wire::decode_uint(r)?;
            Ok(json!([number, untyped_wire_to_dense(r)?]))
        }
        wire::WIRE_ENUM_VALUE_1..=wire::WIRE_ENUM_VALUE_4 => {
            r.read_u8()?;
            let number = (wire_byte - wire::WIRE_ENUM_VALUE_1 + 1) as u64;
            Ok(json!([number, untyped_wire_to_dense(r)?]))
        }
        _ => Ok(match wire::decode_numeric(r)? {
            wire::Numeric::U64(u) => json::u64_to_json(u),
            wire::Numeric::I64(i) => json::i64_to_json(i),
            wire::Numeric::F64(f) => json::float_to_json(f),
        }),
    }
}

/// Re-encodes a generic dense JSON value onto the wire.
fn untyped_dense_to_wire(value: &Value, w: &mut Writer) -> Result<(), DecodeError> {
    match value {
        Value::Null => w.put_u8(wire::WIRE_NULL),
        Value::Bool(b) => wire::encode_bool(w, *b),
        Value::Number(_) => match json::number_from_json(value)? {
            wire::Numeric::U64(u) => wire::encode_uint(w, u),
            wire::Numeric::I64(i) => wire::encode_i64(w, i),
            wire::Numeric::F64(f) => wire::encode_f64(w, f),
        },
        Value::String(s) => wire::encode_string(w, s),
        Value::Array(items) => {
            wire::encode_array_len(w, items.len());
            for item in items {
                untyped_dense_to_wire(item, w)?;
            }
        }
        Value::Object(_) => return Err(json::type_mismatch("dense value", value)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonFlavor::{Dense, Readable};
    use crate::registry::Record;
    use crate::serializer::DecodeMode;
    use crate::testing::{self, Drawing, Point, Shade};
    use crate::timestamp::Timestamp;
    use serde_json::json;

    fn sample_drawing() -> Drawing {
        Drawing {
            name: "demo".to_owned(),
            points: vec![Point {
                x: 3,
                y: -257,
                label: "a".to_owned(),
                _unrecognized: None,
            }],
            created: Timestamp::from_unix_millis(1_692_999_034_586),
            origin: Some(Point::default()),
            _unrecognized: None,
        }
    }

    #[test]
    fn test_descriptor_parse_roundtrip_for_registered_record() {
        testing::init();
        let descriptor = Drawing::serializer().type_descriptor();
        let json = descriptor.as_json();
        let parsed = crate::descriptor::parse_type_descriptor(&json).unwrap();
        assert_eq!(parsed.as_json(), json);
        // The closure contains Drawing and the records it references.
        assert!(parsed.record(&Drawing::record_id()).is_some());
        assert!(parsed.record(&Point::record_id()).is_some());
    }

    #[test]
    fn test_transform_bytes_to_readable_matches_to_json() {
        testing::init();
        let s = Drawing::serializer();
        let value = sample_drawing();
        let descriptor = crate::descriptor::parse_type_descriptor(&s.type_descriptor().as_json())
            .unwrap();
        let out = descriptor
            .transform(&Encoded::Bytes(s.to_bytes(&value)), Format::ReadableJson)
            .unwrap();
        assert_eq!(out, Encoded::Json(s.to_json(&value, Readable)));
    }

    #[test]
    fn test_transform_cross_pairs() {
        testing::init();
        let s = Drawing::serializer();
        let value = sample_drawing();
        let descriptor = s.type_descriptor();

        let bytes = Encoded::Bytes(s.to_bytes(&value));
        let dense = Encoded::Json(s.to_json(&value, Dense));
        let readable = Encoded::Json(s.to_json(&value, Readable));

        // bytes -> dense
        assert_eq!(descriptor.transform(&bytes, Format::DenseJson).unwrap(), dense);
        // dense -> bytes
        assert_eq!(descriptor.transform(&dense, Format::Bytes).unwrap(), bytes);
        // readable -> dense -> readable
        assert_eq!(
            descriptor.transform(&readable, Format::DenseJson).unwrap(),
            dense
        );
        assert_eq!(
            descriptor.transform(&dense, Format::ReadableJson).unwrap(),
            readable
        );
        // bytes -> bytes is the identity
        assert_eq!(descriptor.transform(&bytes, Format::Bytes).unwrap(), bytes);
    }

    #[test]
    fn test_transform_enum_values() {
        testing::init();
        let s = Shade::serializer();
        let descriptor = s.type_descriptor();
        for value in [
            Shade::Unknown,
            Shade::Dark,
            Shade::Custom("teal".to_owned()),
            Shade::Rgb(vec![0, 128, 255]),
        ] {
            let bytes = Encoded::Bytes(s.to_bytes(&value));
            assert_eq!(
                descriptor.transform(&bytes, Format::ReadableJson).unwrap(),
                Encoded::Json(s.to_json(&value, Readable)),
                "readable mismatch for {value:?}"
            );
            assert_eq!(
                descriptor
                    .transform(&Encoded::Json(s.to_json(&value, Readable)), Format::Bytes)
                    .unwrap(),
                bytes,
                "bytes mismatch for {value:?}"
            );
        }
    }

    #[test]
    fn test_transform_carries_unknown_slots_between_dense_forms() {
        testing::init();
        let s = Point::serializer();
        let descriptor = s.type_descriptor();
        // Build bytes with two unknown trailing slots through the typed
        // serializer in keep mode.
        let dense = json!([1, 2, "p", 42, "future"]);
        let kept = s
            .from_json_with(&dense, DecodeMode::KeepUnrecognized)
            .unwrap();
        let json_out = descriptor
            .transform(&Encoded::Json(s.to_json(&kept, Dense)), Format::Bytes)
            .unwrap();
        // And back: the unknown slots survive the bytes round trip.
        assert_eq!(
            descriptor.transform(&json_out, Format::DenseJson).unwrap(),
            Encoded::Json(dense)
        );
    }

    #[test]
    fn test_transform_unknown_record_fails() {
        testing::init();
        let json = json!({
            "type": {"kind": "record", "value": "m:Missing"},
            "records": [
                {"kind": "struct", "id": "m:Missing", "fields": [
                    {"name": "x", "number": 0,
                     "type": {"kind": "record", "value": "m:AlsoMissing"}},
                ]},
            ],
        });
        assert!(crate::descriptor::parse_type_descriptor(&json).is_err());
    }

    #[test]
    fn test_untyped_projection_of_unknown_slot_shapes() {
        // Every wire shape an unknown slot can take has a dense JSON
        // projection, including enum value variants.
        let mut w = Writer::new();
        wire::encode_array_len(&mut w, 5);
        wire::encode_i64(&mut w, -70_000);
        wire::encode_string(&mut w, "s");
        w.put_u8(wire::WIRE_NULL);
        w.put_u8(wire::WIRE_ENUM_VALUE_1);
        wire::encode_uint(&mut w, 7);
        wire::encode_array_len(&mut w, 0);
        let encoded = w.freeze();

        let mut r = Reader::new(&encoded);
        let dense = untyped_wire_to_dense(&mut r).unwrap();
        assert!(r.is_at_end());
        assert_eq!(dense, json!([-70_000, "s", null, [1, 7], []]));
    }

    #[test]
    fn test_untyped_byte_roundtrip() {
        // Without enum variants in play (their array projection is
        // ambiguous schema-free), the untyped projection re-encodes to the
        // original bytes.
        let mut w = Writer::new();
        wire::encode_array_len(&mut w, 4);
        wire::encode_i64(&mut w, -70_000);
        wire::encode_string(&mut w, "s");
        w.put_u8(wire::WIRE_NULL);
        wire::encode_array_len(&mut w, 0);
        let original = w.freeze();

        let mut r = Reader::new(&original);
        let dense = untyped_wire_to_dense(&mut r).unwrap();
        assert!(r.is_at_end());

        let mut w = Writer::new();
        untyped_dense_to_wire(&dense, &mut w).unwrap();
        assert_eq!(w.freeze(), original);
    }
}

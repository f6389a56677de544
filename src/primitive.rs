//! Codecs for the nine primitive types.

use crate::descriptor::{PrimitiveKind, TypeSignature};
use crate::error::DecodeError;
use crate::json::{self, JsonFlavor};
use crate::serializer::{Codec, DecodeMode, Serializer};
use crate::timestamp::Timestamp;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use bytes::Bytes;
use serde_json::{json, Value};
use soia_wire::wire::{self, Numeric};
use soia_wire::{Reader, Writer};
use std::sync::Arc;

pub fn bool_serializer() -> Serializer<bool> {
    Serializer::from_codec(Arc::new(BoolCodec))
}

pub fn int32_serializer() -> Serializer<i32> {
    Serializer::from_codec(Arc::new(Int32Codec))
}

pub fn int64_serializer() -> Serializer<i64> {
    Serializer::from_codec(Arc::new(Int64Codec))
}

pub fn uint64_serializer() -> Serializer<u64> {
    Serializer::from_codec(Arc::new(Uint64Codec))
}

pub fn float32_serializer() -> Serializer<f32> {
    Serializer::from_codec(Arc::new(Float32Codec))
}

pub fn float64_serializer() -> Serializer<f64> {
    Serializer::from_codec(Arc::new(Float64Codec))
}

pub fn timestamp_serializer() -> Serializer<Timestamp> {
    Serializer::from_codec(Arc::new(TimestampCodec))
}

pub fn string_serializer() -> Serializer<String> {
    Serializer::from_codec(Arc::new(StringCodec))
}

pub fn bytes_serializer() -> Serializer<Bytes> {
    Serializer::from_codec(Arc::new(BytesCodec))
}

struct BoolCodec;

impl Codec<bool> for BoolCodec {
    fn encode(&self, value: &bool, w: &mut Writer) {
        wire::encode_bool(w, *value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<bool, DecodeError> {
        Ok(wire::decode_bool(r)?)
    }

    fn to_json(&self, value: &bool, flavor: JsonFlavor) -> Value {
        match flavor {
            JsonFlavor::Dense => Value::from(*value as i32),
            JsonFlavor::Readable => Value::Bool(*value),
        }
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<bool, DecodeError> {
        match value {
            Value::Bool(b) => Ok(*b),
            _ => json::number_from_json(value)
                .map(Numeric::truthy)
                .map_err(|_| json::type_mismatch("boolean or number", value)),
        }
    }

    fn default_value(&self) -> bool {
        false
    }

    fn is_default(&self, value: &bool) -> bool {
        !*value
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Bool)
    }
}

struct Int32Codec;

impl Codec<i32> for Int32Codec {
    fn encode(&self, value: &i32, w: &mut Writer) {
        wire::encode_i32(w, *value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<i32, DecodeError> {
        Ok(wire::decode_i32(r)?)
    }

    fn to_json(&self, value: &i32, _flavor: JsonFlavor) -> Value {
        Value::from(*value)
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<i32, DecodeError> {
        Ok(json::number_from_json(value)?.to_i32())
    }

    fn default_value(&self) -> i32 {
        0
    }

    fn is_default(&self, value: &i32) -> bool {
        *value == 0
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Int32)
    }
}

struct Int64Codec;

impl Codec<i64> for Int64Codec {
    fn encode(&self, value: &i64, w: &mut Writer) {
        wire::encode_i64(w, *value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<i64, DecodeError> {
        Ok(wire::decode_i64(r)?)
    }

    fn to_json(&self, value: &i64, _flavor: JsonFlavor) -> Value {
        json::i64_to_json(*value)
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<i64, DecodeError> {
        Ok(json::number_from_json(value)?.to_i64())
    }

    fn default_value(&self) -> i64 {
        0
    }

    fn is_default(&self, value: &i64) -> bool {
        *value == 0
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Int64)
    }
}

struct Uint64Codec;

impl Codec<u64> for Uint64Codec {
    fn encode(&self, value: &u64, w: &mut Writer) {
        wire::encode_uint(w, *value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<u64, DecodeError> {
        Ok(wire::decode_u64(r)?)
    }

    fn to_json(&self, value: &u64, _flavor: JsonFlavor) -> Value {
        json::u64_to_json(*value)
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<u64, DecodeError> {
        Ok(json::number_from_json(value)?.to_u64())
    }

    fn default_value(&self) -> u64 {
        0
    }

    fn is_default(&self, value: &u64) -> bool {
        *value == 0
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Uint64)
    }
}

struct Float32Codec;

impl Codec<f32> for Float32Codec {
    fn encode(&self, value: &f32, w: &mut Writer) {
        wire::encode_f32(w, *value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<f32, DecodeError> {
        Ok(wire::decode_f32(r)?)
    }

    fn to_json(&self, value: &f32, _flavor: JsonFlavor) -> Value {
        json::float_to_json(*value as f64)
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<f32, DecodeError> {
        Ok(json::float_from_json(value)? as f32)
    }

    fn default_value(&self) -> f32 {
        0.0
    }

    fn is_default(&self, value: &f32) -> bool {
        *value == 0.0
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Float32)
    }
}

struct Float64Codec;

impl Codec<f64> for Float64Codec {
    fn encode(&self, value: &f64, w: &mut Writer) {
        wire::encode_f64(w, *value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<f64, DecodeError> {
        Ok(wire::decode_f64(r)?)
    }

    fn to_json(&self, value: &f64, _flavor: JsonFlavor) -> Value {
        json::float_to_json(*value)
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<f64, DecodeError> {
        json::float_from_json(value)
    }

    fn default_value(&self) -> f64 {
        0.0
    }

    fn is_default(&self, value: &f64) -> bool {
        *value == 0.0
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Float64)
    }
}

struct TimestampCodec;

pub(crate) fn timestamp_from_json(value: &Value) -> Result<Timestamp, DecodeError> {
    let millis_value = match value {
        Value::Object(map) => map
            .get("unix_millis")
            .ok_or_else(|| json::type_mismatch("timestamp", value))?,
        _ => value,
    };
    let numeric = json::number_from_json(millis_value)?;
    if let Numeric::F64(f) = numeric {
        if f.is_nan() {
            return Err(DecodeError::NonFiniteTimestamp);
        }
    }
    Ok(Timestamp::from_unix_millis(numeric.to_i64()))
}

impl Codec<Timestamp> for TimestampCodec {
    fn encode(&self, value: &Timestamp, w: &mut Writer) {
        wire::encode_timestamp_millis(w, value.unix_millis());
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<Timestamp, DecodeError> {
        Ok(Timestamp::from_unix_millis(wire::decode_timestamp_millis(
            r,
        )?))
    }

    fn to_json(&self, value: &Timestamp, flavor: JsonFlavor) -> Value {
        match flavor {
            JsonFlavor::Dense => Value::from(value.unix_millis()),
            JsonFlavor::Readable => json!({
                "unix_millis": value.unix_millis(),
                "formatted": value.format_iso(),
            }),
        }
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<Timestamp, DecodeError> {
        timestamp_from_json(value)
    }

    fn default_value(&self) -> Timestamp {
        Timestamp::UNIX_EPOCH
    }

    fn is_default(&self, value: &Timestamp) -> bool {
        value.unix_millis() == 0
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Timestamp)
    }
}

struct StringCodec;

impl Codec<String> for StringCodec {
    fn encode(&self, value: &String, w: &mut Writer) {
        wire::encode_string(w, value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<String, DecodeError> {
        Ok(wire::decode_string(r)?)
    }

    fn to_json(&self, value: &String, _flavor: JsonFlavor) -> Value {
        Value::String(value.clone())
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<String, DecodeError> {
        match value {
            Value::String(s) => Ok(s.clone()),
            // Dense JSON spells the default string as 0.
            _ if json::is_json_zero(value) => Ok(String::new()),
            _ => Err(json::type_mismatch("string", value)),
        }
    }

    fn default_value(&self) -> String {
        String::new()
    }

    fn is_default(&self, value: &String) -> bool {
        value.is_empty()
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::String)
    }
}

struct BytesCodec;

pub(crate) fn byte_string_to_json(value: &[u8], flavor: JsonFlavor) -> Value {
    match flavor {
        JsonFlavor::Dense => Value::String(BASE64.encode(value)),
        JsonFlavor::Readable => Value::String(format!("hex:{}", hex::encode(value))),
    }
}

pub(crate) fn byte_string_from_json(value: &Value) -> Result<Bytes, DecodeError> {
    match value {
        Value::String(s) => {
            let decoded = if let Some(rest) = s.strip_prefix("hex:") {
                hex::decode(rest)?
            } else {
                BASE64.decode(s)?
            };
            Ok(Bytes::from(decoded))
        }
        _ if json::is_json_zero(value) => Ok(Bytes::new()),
        _ => Err(json::type_mismatch("string", value)),
    }
}

impl Codec<Bytes> for BytesCodec {
    fn encode(&self, value: &Bytes, w: &mut Writer) {
        wire::encode_byte_string(w, value);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<Bytes, DecodeError> {
        Ok(wire::decode_byte_string(r)?)
    }

    fn to_json(&self, value: &Bytes, flavor: JsonFlavor) -> Value {
        byte_string_to_json(value, flavor)
    }

    fn from_json(&self, value: &Value, _mode: DecodeMode) -> Result<Bytes, DecodeError> {
        byte_string_from_json(value)
    }

    fn default_value(&self) -> Bytes {
        Bytes::new()
    }

    fn is_default(&self, value: &Bytes) -> bool {
        value.is_empty()
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Primitive(PrimitiveKind::Bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::JsonFlavor::{Dense, Readable};
    use serde_json::json;

    fn payload(bytes: &Bytes) -> &[u8] {
        &bytes[4..]
    }

    #[test]
    fn test_magic_prefix() {
        let s = int32_serializer();
        let bytes = s.to_bytes(&1);
        assert_eq!(&bytes[..4], b"soia");
    }

    #[test]
    fn test_int32_seed_scenarios() {
        let s = int32_serializer();
        assert_eq!(s.to_json(&232, Dense), json!(232));
        assert_eq!(payload(&s.to_bytes(&232)), [0xe8, 0xe8, 0x00]);
        assert_eq!(s.to_json(&-257, Dense), json!(-257));
        assert_eq!(payload(&s.to_bytes(&-257)), [0xec, 0xff, 0xfe]);
        assert_eq!(s.from_bytes(&s.to_bytes(&-257)).unwrap(), -257);
    }

    #[test]
    fn test_int32_boundary_roundtrips() {
        let s = int32_serializer();
        for v in [
            i32::MIN,
            -65_537,
            -65_536,
            -257,
            -256,
            -1,
            0,
            231,
            232,
            65_535,
            65_536,
            i32::MAX,
        ] {
            assert_eq!(s.from_bytes(&s.to_bytes(&v)).unwrap(), v);
            assert_eq!(s.from_json(&s.to_json(&v, Dense)).unwrap(), v);
        }
    }

    #[test]
    fn test_zero_byte_decodes_to_default() {
        assert_eq!(int32_serializer().from_bytes(b"soia\x00").unwrap(), 0);
        assert_eq!(int64_serializer().from_bytes(b"soia\x00").unwrap(), 0);
        assert_eq!(uint64_serializer().from_bytes(b"soia\x00").unwrap(), 0);
        assert!(!bool_serializer().from_bytes(b"soia\x00").unwrap());
        assert_eq!(float64_serializer().from_bytes(b"soia\x00").unwrap(), 0.0);
        assert_eq!(string_serializer().from_bytes(b"soia\x00").unwrap(), "");
        assert!(bytes_serializer().from_bytes(b"soia\x00").unwrap().is_empty());
        assert_eq!(
            timestamp_serializer().from_bytes(b"soia\x00").unwrap(),
            Timestamp::UNIX_EPOCH
        );
    }

    #[test]
    fn test_json_zero_decodes_to_default() {
        assert_eq!(string_serializer().from_json(&json!(0)).unwrap(), "");
        assert!(bytes_serializer().from_json(&json!(0)).unwrap().is_empty());
        assert!(!bool_serializer().from_json(&json!(0)).unwrap());
    }

    #[test]
    fn test_bool_forms() {
        let s = bool_serializer();
        assert_eq!(s.to_json(&true, Dense), json!(1));
        assert_eq!(s.to_json(&true, Readable), json!(true));
        assert!(s.from_json(&json!(true)).unwrap());
        assert!(s.from_json(&json!(2)).unwrap());
        assert_eq!(payload(&s.to_bytes(&true)), [0x01]);
    }

    #[test]
    fn test_int64_large_values_stringify() {
        let s = int64_serializer();
        let v = i64::MAX;
        assert_eq!(s.to_json(&v, Dense), json!("9223372036854775807"));
        assert_eq!(s.from_json(&s.to_json(&v, Dense)).unwrap(), v);
        assert_eq!(s.from_bytes(&s.to_bytes(&v)).unwrap(), v);
    }

    #[test]
    fn test_uint64_clamps_negative_json() {
        assert_eq!(uint64_serializer().from_json(&json!(-5)).unwrap(), 0);
    }

    #[test]
    fn test_float_nan_is_not_default() {
        let s = float64_serializer();
        assert!(!s.is_default(&f64::NAN));
        assert!(s.is_default(&0.0));
        assert_eq!(s.to_json(&f64::NAN, Dense), json!("NaN"));
        assert!(s.from_json(&json!("NaN")).unwrap().is_nan());
        assert!(s.from_bytes(&s.to_bytes(&f64::NAN)).unwrap().is_nan());
    }

    #[test]
    fn test_float32_narrowing() {
        let s = float32_serializer();
        let v = 3.14_f32;
        assert_eq!(s.from_json(&s.to_json(&v, Dense)).unwrap(), v);
        assert_eq!(s.from_bytes(&s.to_bytes(&v)).unwrap(), v);
    }

    #[test]
    fn test_timestamp_seed_scenario() {
        let s = timestamp_serializer();
        let ts = Timestamp::from_unix_millis(1_692_999_034_586);
        assert_eq!(s.to_json(&ts, Dense), json!(1_692_999_034_586_i64));
        assert_eq!(
            s.to_json(&ts, Readable),
            json!({
                "unix_millis": 1_692_999_034_586_i64,
                "formatted": "2023-08-25T21:30:34.586Z",
            })
        );
        assert_eq!(
            payload(&s.to_bytes(&ts)),
            [0xef, 0xda, 0x26, 0x9b, 0x2e, 0x8a, 0x01, 0x00, 0x00]
        );
        assert_eq!(s.from_json(&s.to_json(&ts, Readable)).unwrap(), ts);
        assert_eq!(s.from_json(&json!("1692999034586")).unwrap(), ts);
    }

    #[test]
    fn test_timestamp_nan_raises() {
        let s = timestamp_serializer();
        assert!(matches!(
            s.from_json(&json!("NaN")),
            Err(DecodeError::NonFiniteTimestamp)
        ));
    }

    #[test]
    fn test_timestamp_clamping_from_json() {
        let s = timestamp_serializer();
        let ts = s.from_json(&json!(1e300)).unwrap();
        assert_eq!(ts, Timestamp::MAX);
    }

    #[test]
    fn test_string_utf8_roundtrip() {
        let s = string_serializer();
        let v = "héllo wörld — ευχαριστώ".to_owned();
        assert_eq!(s.from_bytes(&s.to_bytes(&v)).unwrap(), v);
        assert_eq!(s.from_json(&s.to_json(&v, Readable)).unwrap(), v);
    }

    #[test]
    fn test_bytes_seed_scenario() {
        let s = bytes_serializer();
        let v = Bytes::from_static(&[0x69, 0xb7, 0x35, 0xdb]);
        assert_eq!(s.to_json(&v, Dense), json!("abc12w=="));
        assert_eq!(s.to_json(&v, Readable), json!("hex:69b735db"));
        assert_eq!(payload(&s.to_bytes(&v)), [0xf5, 0x04, 0x69, 0xb7, 0x35, 0xdb]);
        assert_eq!(s.from_json(&json!("abc12w==")).unwrap(), v);
        assert_eq!(s.from_json(&json!("hex:69b735db")).unwrap(), v);
    }

    #[test]
    fn test_bytes_invalid_encodings() {
        let s = bytes_serializer();
        assert!(matches!(
            s.from_json(&json!("not/base64???")),
            Err(DecodeError::InvalidBase64(_))
        ));
        assert!(matches!(
            s.from_json(&json!("hex:xyz")),
            Err(DecodeError::InvalidBase16(_))
        ));
    }

    #[test]
    fn test_type_mismatch_errors() {
        assert!(int32_serializer().from_json(&json!({})).is_err());
        assert!(string_serializer().from_json(&json!([1])).is_err());
        assert!(timestamp_serializer().from_json(&json!(null)).is_err());
    }
}

//! Enum serializers driven by registration-time variant tables.

use crate::descriptor::{FieldDescriptor, RecordDescriptor, RecordKind, TypeSignature};
use crate::error::{DecodeError, RegistrationError};
use crate::json::{self, JsonFlavor};
use crate::registry::{ErasedRecordDef, Record, RecordDef};
use crate::serializer::{Codec, DecodeMode, Serializer};
use crate::unrecognized::{EnumPayload, Token, UnrecognizedEnum};
use bytes::Bytes;
use serde_json::{json, Value};
use soia_wire::{skip_value, wire, Reader, Writer};
use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

/// A constant variant: UPPER_CASE name, no payload.
struct ConstVariant<R> {
    name: &'static str,
    number: u32,
    value: R,
    is: fn(&R) -> bool,
}

/// Type-erased operations on one value-carrying variant.
trait VariantOps<R>: Send + Sync {
    fn name(&self) -> &'static str;
    fn number(&self) -> u32;
    fn wire_serializer(&self);
    fn signature(&self) -> TypeSignature;
    fn matches(&self, record: &R) -> bool;
    fn encode_payload(&self, record: &R, w: &mut Writer);
    fn decode_payload(&self, r: &mut Reader<'_>) -> Result<R, DecodeError>;
    fn payload_to_json(&self, record: &R, flavor: JsonFlavor) -> Value;
    fn payload_from_json(&self, value: &Value, mode: DecodeMode) -> Result<R, DecodeError>;
}

struct ValueVariant<R, F> {
    name: &'static str,
    number: u32,
    wrap: fn(F) -> R,
    unwrap: fn(&R) -> Option<&F>,
    make: fn() -> Serializer<F>,
    serializer: OnceLock<Serializer<F>>,
}

impl<R, F> ValueVariant<R, F> {
    fn serializer(&self) -> &Serializer<F> {
        self.serializer
            .get()
            .expect("variant serializer used before registration completed")
    }

    fn payload<'a>(&self, record: &'a R) -> &'a F {
        (self.unwrap)(record).expect("variant does not match record")
    }
}

impl<R, F: 'static> VariantOps<R> for ValueVariant<R, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn number(&self) -> u32 {
        self.number
    }

    fn wire_serializer(&self) {
        let _ = self.serializer.set((self.make)());
    }

    fn signature(&self) -> TypeSignature {
        self.serializer().codec().signature()
    }

    fn matches(&self, record: &R) -> bool {
        (self.unwrap)(record).is_some()
    }

    fn encode_payload(&self, record: &R, w: &mut Writer) {
        self.serializer().codec().encode(self.payload(record), w);
    }

    fn decode_payload(&self, r: &mut Reader<'_>) -> Result<R, DecodeError> {
        Ok((self.wrap)(self.serializer().codec().decode(r)?))
    }

    fn payload_to_json(&self, record: &R, flavor: JsonFlavor) -> Value {
        self.serializer().codec().to_json(self.payload(record), flavor)
    }

    fn payload_from_json(&self, value: &Value, mode: DecodeMode) -> Result<R, DecodeError> {
        Ok((self.wrap)(self.serializer().codec().from_json(value, mode)?))
    }
}

/// Builds the serializer definition for one generated enum.
pub struct EnumBuilder<R: Record> {
    constants: Vec<ConstVariant<R>>,
    values: Vec<Box<dyn VariantOps<R>>>,
    removed_numbers: Vec<u32>,
    is_unknown: fn(&R) -> bool,
    wrap_unrecognized: fn(UnrecognizedEnum) -> R,
    get_unrecognized: fn(&R) -> Option<&UnrecognizedEnum>,
}

impl<R: Record> EnumBuilder<R> {
    pub fn new(
        is_unknown: fn(&R) -> bool,
        wrap_unrecognized: fn(UnrecognizedEnum) -> R,
        get_unrecognized: fn(&R) -> Option<&UnrecognizedEnum>,
    ) -> Self {
        Self {
            constants: Vec::new(),
            values: Vec::new(),
            removed_numbers: Vec::new(),
            is_unknown,
            wrap_unrecognized,
            get_unrecognized,
        }
    }

    pub fn constant(
        mut self,
        name: &'static str,
        number: u32,
        value: R,
        is: fn(&R) -> bool,
    ) -> Self {
        self.constants.push(ConstVariant {
            name,
            number,
            value,
            is,
        });
        self
    }

    pub fn value_variant<F: 'static>(
        mut self,
        name: &'static str,
        number: u32,
        wrap: fn(F) -> R,
        unwrap: fn(&R) -> Option<&F>,
        make: fn() -> Serializer<F>,
    ) -> Self {
        self.values.push(Box::new(ValueVariant {
            name,
            number,
            wrap,
            unwrap,
            make,
            serializer: OnceLock::new(),
        }));
        self
    }

    pub fn removed_numbers(mut self, numbers: &[u32]) -> Self {
        self.removed_numbers.extend_from_slice(numbers);
        self
    }

    pub fn build(self) -> RecordDef {
        RecordDef(Box::new(EnumDef::<R> {
            builder: Some(self),
            codec: None,
        }))
    }
}

struct EnumDef<R: Record> {
    builder: Option<EnumBuilder<R>>,
    codec: Option<Arc<EnumCodec<R>>>,
}

impl<R: Record> ErasedRecordDef for EnumDef<R> {
    fn module_path(&self) -> &'static str {
        R::MODULE_PATH
    }

    fn id(&self) -> String {
        R::record_id()
    }

    fn create_serializer(&mut self) -> Box<dyn Any + Send + Sync> {
        let builder = self.builder.take().expect("record registered twice");
        let codec = Arc::new(EnumCodec {
            token: Token::new(),
            constants: builder.constants,
            values: builder.values,
            removed_numbers: builder.removed_numbers,
            is_unknown: builder.is_unknown,
            wrap_unrecognized: builder.wrap_unrecognized,
            get_unrecognized: builder.get_unrecognized,
            default: OnceLock::new(),
        });
        self.codec = Some(codec.clone());
        let erased: Arc<dyn Codec<R>> = codec;
        Box::new(Serializer::from_codec(erased))
    }

    fn finish(&mut self) -> Result<RecordDescriptor, RegistrationError> {
        self.codec
            .as_ref()
            .expect("registration pass 2 before pass 1")
            .freeze()
    }
}

struct EnumCodec<R: Record> {
    token: Token,
    constants: Vec<ConstVariant<R>>,
    values: Vec<Box<dyn VariantOps<R>>>,
    removed_numbers: Vec<u32>,
    is_unknown: fn(&R) -> bool,
    wrap_unrecognized: fn(UnrecognizedEnum) -> R,
    get_unrecognized: fn(&R) -> Option<&UnrecognizedEnum>,
    default: OnceLock<R>,
}

impl<R: Record> EnumCodec<R> {
    fn freeze(&self) -> Result<RecordDescriptor, RegistrationError> {
        let id = R::record_id();
        let mut numbers = HashSet::new();
        let mut names = HashSet::new();
        for constant in &self.constants {
            if constant.number == 0 {
                return Err(RegistrationError::ReservedFieldNumber {
                    record: id,
                    number: 0,
                });
            }
            if !numbers.insert(constant.number) {
                return Err(RegistrationError::DuplicateFieldNumber {
                    record: id,
                    number: constant.number,
                });
            }
            if !names.insert(constant.name) {
                return Err(RegistrationError::DuplicateFieldName {
                    record: id,
                    name: constant.name,
                });
            }
        }
        for variant in &self.values {
            variant.wire_serializer();
            if variant.number() == 0 {
                return Err(RegistrationError::ReservedFieldNumber {
                    record: id,
                    number: 0,
                });
            }
            if !numbers.insert(variant.number()) {
                return Err(RegistrationError::DuplicateFieldNumber {
                    record: id,
                    number: variant.number(),
                });
            }
            if !names.insert(variant.name()) {
                return Err(RegistrationError::DuplicateFieldName {
                    record: id,
                    name: variant.name(),
                });
            }
        }
        for &number in &self.removed_numbers {
            if numbers.contains(&number) {
                return Err(RegistrationError::RemovedNumberActive { record: id, number });
            }
        }
        for variant in &self.values {
            crate::descriptor::validate_key_extractors(&variant.signature())?;
        }

        let mut fields: Vec<FieldDescriptor> = self
            .constants
            .iter()
            .map(|c| FieldDescriptor {
                name: c.name.to_owned(),
                number: c.number,
                signature: None,
            })
            .chain(self.values.iter().map(|v| FieldDescriptor {
                name: v.name().to_owned(),
                number: v.number(),
                signature: Some(v.signature()),
            }))
            .collect();
        fields.sort_by_key(|f| f.number);
        let mut removed_numbers = self.removed_numbers.clone();
        removed_numbers.sort_unstable();
        Ok(RecordDescriptor {
            kind: RecordKind::Enum,
            id,
            fields,
            removed_numbers,
        })
    }

    fn default_ref(&self) -> &R {
        self.default.get_or_init(R::default)
    }

    fn constant_by_number(&self, number: i64) -> Option<&ConstVariant<R>> {
        self.constants.iter().find(|c| c.number as i64 == number)
    }

    fn value_by_number(&self, number: i64) -> Option<&dyn VariantOps<R>> {
        self.values
            .iter()
            .find(|v| v.number() as i64 == number)
            .map(|v| v.as_ref())
    }

    fn value_by_name(&self, name: &str) -> Option<&dyn VariantOps<R>> {
        self.values
            .iter()
            .find(|v| v.name() == name)
            .map(|v| v.as_ref())
    }

    /// Writes the wire header for a value variant with the given number.
    fn encode_value_header(w: &mut Writer, number: u32) {
        if (1..=4).contains(&number) {
            w.put_u8(wire::WIRE_ENUM_VALUE_1 + (number - 1) as u8);
        } else {
            w.put_u8(wire::WIRE_ENUM_VALUE);
            wire::encode_uint(w, number as u64);
        }
    }

    fn decode_value_variant(
        &self,
        r: &mut Reader<'_>,
        start: usize,
        number: u64,
    ) -> Result<R, DecodeError> {
        if let Some(variant) = self.value_by_number(number as i64) {
            return variant.decode_payload(r);
        }
        if self.constant_by_number(number as i64).is_some() {
            return Err(DecodeError::WrongVariantKind {
                number,
                expected: "value",
            });
        }
        // Unknown or removed number: skip the payload, optionally keeping
        // the whole element.
        skip_value(r)?;
        if r.keep_unrecognized() {
            let raw = Bytes::copy_from_slice(r.slice_since(start));
            Ok((self.wrap_unrecognized)(UnrecognizedEnum {
                token: self.token.clone(),
                payload: EnumPayload::Bytes(raw),
            }))
        } else {
            Ok(self.default_ref().clone())
        }
    }
}

impl<R: Record> Codec<R> for EnumCodec<R> {
    fn encode(&self, value: &R, w: &mut Writer) {
        if let Some(unrecognized) = (self.get_unrecognized)(value) {
            if unrecognized.token == self.token {
                if let EnumPayload::Bytes(raw) = &unrecognized.payload {
                    w.put_slice(raw);
                    return;
                }
            }
            w.put_u8(0);
            return;
        }
        for constant in &self.constants {
            if (constant.is)(value) {
                wire::encode_uint(w, constant.number as u64);
                return;
            }
        }
        for variant in &self.values {
            if variant.matches(value) {
                Self::encode_value_header(w, variant.number());
                variant.encode_payload(value, w);
                return;
            }
        }
        // UNKNOWN
        w.put_u8(0);
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<R, DecodeError> {
        let start = r.position();
        let wire_byte = r.peek_u8()?;
        if wire_byte < wire::WIRE_STRING_EMPTY {
            // An integer: selects a constant variant.
            let number = wire::decode_numeric(r)?.to_i64();
            if number == 0 {
                return Ok(self.default_ref().clone());
            }
            if let Some(constant) = self.constant_by_number(number) {
                return Ok(constant.value.clone());
            }
            if self.value_by_number(number).is_some() {
                return Err(DecodeError::WrongVariantKind {
                    number: number.max(0) as u64,
                    expected: "constant",
                });
            }
            if r.keep_unrecognized() {
                let raw = Bytes::copy_from_slice(r.slice_since(start));
                return Ok((self.wrap_unrecognized)(UnrecognizedEnum {
                    token: self.token.clone(),
                    payload: EnumPayload::Bytes(raw),
                }));
            }
            return Ok(self.default_ref().clone());
        }
        match wire_byte {
            wire::WIRE_ENUM_VALUE => {
                r.read_u8()?;
                let number = wire::decode_uint(r)?;
                self.decode_value_variant(r, start, number)
            }
            wire::WIRE_ENUM_VALUE_1..=wire::WIRE_ENUM_VALUE_4 => {
                r.read_u8()?;
                let number = (wire_byte - wire::WIRE_ENUM_VALUE_1 + 1) as u64;
                self.decode_value_variant(r, start, number)
            }
            _ => Err(soia_wire::WireError::InvalidWire {
                wire: wire_byte,
                offset: start,
            }
            .into()),
        }
    }

    fn to_json(&self, value: &R, flavor: JsonFlavor) -> Value {
        if let Some(unrecognized) = (self.get_unrecognized)(value) {
            if flavor == JsonFlavor::Dense && unrecognized.token == self.token {
                if let EnumPayload::Json(json) = &unrecognized.payload {
                    return json.clone();
                }
            }
            return match flavor {
                JsonFlavor::Dense => Value::from(0),
                JsonFlavor::Readable => Value::String("?".to_owned()),
            };
        }
        for constant in &self.constants {
            if (constant.is)(value) {
                return match flavor {
                    JsonFlavor::Dense => Value::from(constant.number),
                    JsonFlavor::Readable => Value::String(constant.name.to_owned()),
                };
            }
        }
        for variant in &self.values {
            if variant.matches(value) {
                return match flavor {
                    JsonFlavor::Dense => {
                        json!([variant.number(), variant.payload_to_json(value, flavor)])
                    }
                    JsonFlavor::Readable => json!({
                        "kind": variant.name(),
                        "value": variant.payload_to_json(value, flavor),
                    }),
                };
            }
        }
        match flavor {
            JsonFlavor::Dense => Value::from(0),
            JsonFlavor::Readable => Value::String("?".to_owned()),
        }
    }

    fn from_json(&self, value: &Value, mode: DecodeMode) -> Result<R, DecodeError> {
        match value {
            Value::Number(_) => {
                let number = json::number_from_json(value)?.to_i64();
                if number == 0 {
                    return Ok(self.default_ref().clone());
                }
                if let Some(constant) = self.constant_by_number(number) {
                    return Ok(constant.value.clone());
                }
                if self.value_by_number(number).is_some() {
                    return Err(DecodeError::WrongVariantKind {
                        number: number.max(0) as u64,
                        expected: "constant",
                    });
                }
                if mode == DecodeMode::KeepUnrecognized {
                    return Ok((self.wrap_unrecognized)(UnrecognizedEnum {
                        token: self.token.clone(),
                        payload: EnumPayload::Json(value.clone()),
                    }));
                }
                Ok(self.default_ref().clone())
            }
            Value::String(s) => {
                if s == "?" {
                    return Ok(self.default_ref().clone());
                }
                if let Some(constant) = self.constants.iter().find(|c| c.name == s) {
                    return Ok(constant.value.clone());
                }
                // Numeric readable inputs are also accepted.
                if let Ok(number) = s.parse::<i64>() {
                    return self.from_json(&Value::from(number), mode);
                }
                // An unknown readable name is dropped, never preserved.
                Ok(self.default_ref().clone())
            }
            Value::Array(items) => {
                let number = match items.first() {
                    Some(first) => json::number_from_json(first)?.to_i64(),
                    None => return Err(json::type_mismatch("enum value", value)),
                };
                let payload = items.get(1).unwrap_or(&Value::Null);
                if let Some(variant) = self.value_by_number(number) {
                    return variant.payload_from_json(payload, mode);
                }
                if self.constant_by_number(number).is_some() {
                    return Err(DecodeError::WrongVariantKind {
                        number: number.max(0) as u64,
                        expected: "value",
                    });
                }
                if mode == DecodeMode::KeepUnrecognized {
                    return Ok((self.wrap_unrecognized)(UnrecognizedEnum {
                        token: self.token.clone(),
                        payload: EnumPayload::Json(value.clone()),
                    }));
                }
                Ok(self.default_ref().clone())
            }
            Value::Object(map) => {
                let kind = map
                    .get("kind")
                    .and_then(Value::as_str)
                    .ok_or_else(|| json::type_mismatch("enum object", value))?;
                let payload = map.get("value").unwrap_or(&Value::Null);
                match self.value_by_name(kind) {
                    Some(variant) => variant.payload_from_json(payload, mode),
                    None => Ok(self.default_ref().clone()),
                }
            }
            _ => Err(json::type_mismatch("enum value", value)),
        }
    }

    fn default_value(&self) -> R {
        self.default_ref().clone()
    }

    fn is_default(&self, value: &R) -> bool {
        (self.is_unknown)(value) && (self.get_unrecognized)(value).is_none()
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Record(R::record_id())
    }
}

#[cfg(test)]
mod tests {
    use crate::error::DecodeError;
    use crate::json::JsonFlavor::{Dense, Readable};
    use crate::registry::Record;
    use crate::serializer::DecodeMode;
    use crate::testing::{self, Shade};
    use serde_json::json;
    use soia_wire::{wire, Writer};

    fn payload(bytes: &bytes::Bytes) -> &[u8] {
        &bytes[4..]
    }

    #[test]
    fn test_unknown_is_default() {
        testing::init();
        let s = Shade::serializer();
        assert_eq!(s.default_value(), Shade::Unknown);
        assert!(s.is_default(&Shade::Unknown));
        assert_eq!(payload(&s.to_bytes(&Shade::Unknown)), [0x00]);
        assert_eq!(s.from_bytes(b"soia\x00").unwrap(), Shade::Unknown);
        assert_eq!(s.from_json(&json!(0)).unwrap(), Shade::Unknown);
        assert_eq!(s.to_json(&Shade::Unknown, Readable), json!("?"));
        assert_eq!(s.from_json(&json!("?")).unwrap(), Shade::Unknown);
    }

    #[test]
    fn test_constant_variants() {
        testing::init();
        let s = Shade::serializer();
        assert_eq!(payload(&s.to_bytes(&Shade::Light)), [0x01]);
        assert_eq!(payload(&s.to_bytes(&Shade::Dark)), [0x02]);
        assert_eq!(s.to_json(&Shade::Dark, Dense), json!(2));
        assert_eq!(s.to_json(&Shade::Dark, Readable), json!("DARK"));
        assert_eq!(s.from_json(&json!("DARK")).unwrap(), Shade::Dark);
        assert_eq!(s.from_json(&json!(2)).unwrap(), Shade::Dark);
        assert_eq!(s.from_json(&json!("2")).unwrap(), Shade::Dark);
        assert_eq!(s.from_bytes(&s.to_bytes(&Shade::Light)).unwrap(), Shade::Light);
    }

    #[test]
    fn test_value_variant_small_number() {
        testing::init();
        let s = Shade::serializer();
        let v = Shade::Custom("teal".to_owned());
        // Number 3 uses the 251..=254 wire branch.
        let bytes = s.to_bytes(&v);
        assert_eq!(payload(&bytes)[0], 0xfd);
        assert_eq!(s.from_bytes(&bytes).unwrap(), v);
        assert_eq!(s.to_json(&v, Dense), json!([3, "teal"]));
        assert_eq!(
            s.to_json(&v, Readable),
            json!({"kind": "custom", "value": "teal"})
        );
        assert_eq!(s.from_json(&s.to_json(&v, Dense)).unwrap(), v);
        assert_eq!(s.from_json(&s.to_json(&v, Readable)).unwrap(), v);
    }

    #[test]
    fn test_value_variant_large_number() {
        testing::init();
        let s = Shade::serializer();
        let v = Shade::Rgb(vec![1, 2, 3]);
        // Number 5 uses the 248 wire branch.
        let bytes = s.to_bytes(&v);
        assert_eq!(&payload(&bytes)[..2], [0xf8, 0x05]);
        assert_eq!(s.from_bytes(&bytes).unwrap(), v);
        assert_eq!(s.to_json(&v, Dense), json!([5, [1, 2, 3]]));
        assert_eq!(s.from_json(&s.to_json(&v, Readable)).unwrap(), v);
    }

    #[test]
    fn test_wrong_variant_kind_fails() {
        testing::init();
        let s = Shade::serializer();
        // 3 is a value variant; a bare number must not select it.
        assert!(matches!(
            s.from_json(&json!(3)),
            Err(DecodeError::WrongVariantKind { number: 3, .. })
        ));
        // 2 is a constant; the value form must not select it.
        assert!(matches!(
            s.from_json(&json!([2, "x"])),
            Err(DecodeError::WrongVariantKind { number: 2, .. })
        ));
        // Same on the wire: header for value variant 2, then a payload.
        let mut w = Writer::new();
        w.put_slice(b"soia");
        w.put_u8(wire::WIRE_ENUM_VALUE_1 + 1);
        wire::encode_string(&mut w, "x");
        assert!(matches!(
            s.from_bytes(&w.freeze()),
            Err(DecodeError::WrongVariantKind { number: 2, .. })
        ));
    }

    #[test]
    fn test_unknown_number_dropped_by_default() {
        testing::init();
        let s = Shade::serializer();
        // Constant number 99 from a newer schema.
        let mut w = Writer::new();
        w.put_slice(b"soia");
        wire::encode_uint(&mut w, 99);
        assert_eq!(s.from_bytes(&w.freeze()).unwrap(), Shade::Unknown);

        // Value variant number 9 with a payload.
        let mut w = Writer::new();
        w.put_slice(b"soia");
        w.put_u8(wire::WIRE_ENUM_VALUE);
        wire::encode_uint(&mut w, 9);
        wire::encode_string(&mut w, "future");
        assert_eq!(s.from_bytes(&w.freeze()).unwrap(), Shade::Unknown);
    }

    #[test]
    fn test_unknown_variant_preserved_in_keep_mode() {
        testing::init();
        let s = Shade::serializer();
        let mut w = Writer::new();
        w.put_slice(b"soia");
        w.put_u8(wire::WIRE_ENUM_VALUE);
        wire::encode_uint(&mut w, 9);
        wire::encode_string(&mut w, "future");
        let input = w.freeze();

        let kept = s
            .from_bytes_with(&input, DecodeMode::KeepUnrecognized)
            .unwrap();
        assert!(matches!(kept, Shade::Unrecognized(_)));
        assert!(!s.is_default(&kept));
        // Byte-for-byte round trip.
        assert_eq!(s.to_bytes(&kept), input);
    }

    #[test]
    fn test_unknown_json_preserved_in_keep_mode() {
        testing::init();
        let s = Shade::serializer();
        let input = json!([9, "future"]);
        let kept = s
            .from_json_with(&input, DecodeMode::KeepUnrecognized)
            .unwrap();
        assert!(matches!(kept, Shade::Unrecognized(_)));
        assert_eq!(s.to_json(&kept, Dense), input);
        assert_eq!(s.to_json(&kept, Readable), json!("?"));
        // JSON-captured unknowns do not cross into bytes.
        assert_eq!(payload(&s.to_bytes(&kept)), [0x00]);
    }

    #[test]
    fn test_unknown_readable_name_is_dropped() {
        testing::init();
        let s = Shade::serializer();
        assert_eq!(s.from_json(&json!("NEON")).unwrap(), Shade::Unknown);
        assert_eq!(
            s.from_json(&json!({"kind": "neon", "value": 1})).unwrap(),
            Shade::Unknown
        );
    }

    #[test]
    fn test_enum_rejects_null_wire() {
        testing::init();
        let s = Shade::serializer();
        assert!(s.from_bytes(b"soia\xff").is_err());
    }
}

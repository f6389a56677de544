//! Struct serializers driven by registration-time field tables.

use crate::descriptor::{FieldDescriptor, RecordDescriptor, RecordKind, TypeSignature};
use crate::error::{DecodeError, RegistrationError};
use crate::json::{self, JsonFlavor};
use crate::registry::{ErasedRecordDef, Record, RecordDef};
use crate::serializer::{Codec, DecodeMode, Serializer};
use crate::unrecognized::{FieldsPayload, Token, UnrecognizedFields};
use bytes::Bytes;
use serde_json::{Map, Value};
use soia_wire::{skip_value, wire, Reader, Writer};
use std::any::Any;
use std::collections::HashSet;
use std::sync::{Arc, OnceLock};

/// Type-erased operations on one struct field. Implementations pair a
/// getter/setter with the field's serializer, wired lazily so that fields
/// may reference records registered in the same pass.
trait FieldOps<R>: Send + Sync {
    fn wire_serializer(&self);
    fn signature(&self) -> TypeSignature;
    fn encode(&self, record: &R, w: &mut Writer);
    fn decode_into(&self, record: &mut R, r: &mut Reader<'_>) -> Result<(), DecodeError>;
    fn to_json(&self, record: &R, flavor: JsonFlavor) -> Value;
    fn from_json_into(
        &self,
        record: &mut R,
        value: &Value,
        mode: DecodeMode,
    ) -> Result<(), DecodeError>;
    fn is_default(&self, record: &R) -> bool;
}

struct FieldImpl<R, F> {
    get: fn(&R) -> &F,
    set: fn(&mut R, F),
    make: fn() -> Serializer<F>,
    serializer: OnceLock<Serializer<F>>,
}

impl<R, F> FieldImpl<R, F> {
    fn serializer(&self) -> &Serializer<F> {
        self.serializer
            .get()
            .expect("field serializer used before registration completed")
    }
}

impl<R, F: 'static> FieldOps<R> for FieldImpl<R, F> {
    fn wire_serializer(&self) {
        let _ = self.serializer.set((self.make)());
    }

    fn signature(&self) -> TypeSignature {
        self.serializer().codec().signature()
    }

    fn encode(&self, record: &R, w: &mut Writer) {
        self.serializer().codec().encode((self.get)(record), w);
    }

    fn decode_into(&self, record: &mut R, r: &mut Reader<'_>) -> Result<(), DecodeError> {
        let value = self.serializer().codec().decode(r)?;
        (self.set)(record, value);
        Ok(())
    }

    fn to_json(&self, record: &R, flavor: JsonFlavor) -> Value {
        self.serializer().codec().to_json((self.get)(record), flavor)
    }

    fn from_json_into(
        &self,
        record: &mut R,
        value: &Value,
        mode: DecodeMode,
    ) -> Result<(), DecodeError> {
        let parsed = self.serializer().codec().from_json(value, mode)?;
        (self.set)(record, parsed);
        Ok(())
    }

    fn is_default(&self, record: &R) -> bool {
        self.serializer().codec().is_default((self.get)(record))
    }
}

struct FieldEntry<R> {
    name: &'static str,
    number: u32,
    ops: Box<dyn FieldOps<R>>,
}

/// Builds the serializer definition for one generated struct.
pub struct StructBuilder<R: Record> {
    fields: Vec<FieldEntry<R>>,
    removed_numbers: Vec<u32>,
    get_unrecognized: fn(&R) -> Option<&UnrecognizedFields>,
    set_unrecognized: fn(&mut R, Option<UnrecognizedFields>),
}

impl<R: Record> StructBuilder<R> {
    pub fn new(
        get_unrecognized: fn(&R) -> Option<&UnrecognizedFields>,
        set_unrecognized: fn(&mut R, Option<UnrecognizedFields>),
    ) -> Self {
        Self {
            fields: Vec::new(),
            removed_numbers: Vec::new(),
            get_unrecognized,
            set_unrecognized,
        }
    }

    /// Declares a field. `name` is the schema-side snake_case name; `make`
    /// is resolved during registration pass 2.
    pub fn field<F: 'static>(
        mut self,
        name: &'static str,
        number: u32,
        get: fn(&R) -> &F,
        set: fn(&mut R, F),
        make: fn() -> Serializer<F>,
    ) -> Self {
        self.fields.push(FieldEntry {
            name,
            number,
            ops: Box::new(FieldImpl {
                get,
                set,
                make,
                serializer: OnceLock::new(),
            }),
        });
        self
    }

    pub fn removed_numbers(mut self, numbers: &[u32]) -> Self {
        self.removed_numbers.extend_from_slice(numbers);
        self
    }

    pub fn build(self) -> RecordDef {
        RecordDef(Box::new(StructDef::<R> {
            builder: Some(self),
            codec: None,
        }))
    }
}

struct StructDef<R: Record> {
    builder: Option<StructBuilder<R>>,
    codec: Option<Arc<StructCodec<R>>>,
}

impl<R: Record> ErasedRecordDef for StructDef<R> {
    fn module_path(&self) -> &'static str {
        R::MODULE_PATH
    }

    fn id(&self) -> String {
        R::record_id()
    }

    fn create_serializer(&mut self) -> Box<dyn Any + Send + Sync> {
        let builder = self.builder.take().expect("record registered twice");
        let codec = Arc::new(StructCodec::from_builder(builder));
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

/// One dense slot of the struct encoding.
#[derive(Clone, Copy)]
enum Slot {
    /// Index into the sorted field table.
    Field(usize),
    /// Removed number or numbering gap; skipped on decode, zero on encode.
    Unused,
}

struct StructCodec<R: Record> {
    token: Token,
    fields: Vec<FieldEntry<R>>,
    removed_numbers: Vec<u32>,
    get_unrecognized: fn(&R) -> Option<&UnrecognizedFields>,
    set_unrecognized: fn(&mut R, Option<UnrecognizedFields>),
    /// Slot table of length `recognized_slots`; set when the definition is
    /// frozen at the end of registration.
    slots: OnceLock<Vec<Slot>>,
    default: OnceLock<R>,
}

impl<R: Record> StructCodec<R> {
    fn from_builder(builder: StructBuilder<R>) -> Self {
        let mut fields = builder.fields;
        fields.sort_by_key(|f| f.number);
        Self {
            token: Token::new(),
            fields,
            removed_numbers: builder.removed_numbers,
            get_unrecognized: builder.get_unrecognized,
            set_unrecognized: builder.set_unrecognized,
            slots: OnceLock::new(),
            default: OnceLock::new(),
        }
    }

    fn freeze(&self) -> Result<RecordDescriptor, RegistrationError> {
        let id = R::record_id();
        let mut numbers = HashSet::new();
        let mut names = HashSet::new();
        for field in &self.fields {
            field.ops.wire_serializer();
            if !numbers.insert(field.number) {
                return Err(RegistrationError::DuplicateFieldNumber {
                    record: id,
                    number: field.number,
                });
            }
            if !names.insert(field.name) {
                return Err(RegistrationError::DuplicateFieldName {
                    record: id,
                    name: field.name,
                });
            }
        }
        for &number in &self.removed_numbers {
            if numbers.contains(&number) {
                return Err(RegistrationError::RemovedNumberActive { record: id, number });
            }
        }
        for field in &self.fields {
            crate::descriptor::validate_key_extractors(&field.ops.signature())?;
        }

        let active_slots = self.fields.iter().map(|f| f.number + 1).max().unwrap_or(0);
        let removed_slots = self.removed_numbers.iter().map(|n| n + 1).max().unwrap_or(0);
        let recognized = active_slots.max(removed_slots) as usize;
        let mut slots = vec![Slot::Unused; recognized];
        for (index, field) in self.fields.iter().enumerate() {
            slots[field.number as usize] = Slot::Field(index);
        }
        let _ = self.slots.set(slots);

        let mut removed_numbers = self.removed_numbers.clone();
        removed_numbers.sort_unstable();
        Ok(RecordDescriptor {
            kind: RecordKind::Struct,
            id,
            fields: self
                .fields
                .iter()
                .map(|f| FieldDescriptor {
                    name: f.name.to_owned(),
                    number: f.number,
                    signature: Some(f.ops.signature()),
                })
                .collect(),
            removed_numbers,
        })
    }

    fn slots(&self) -> &[Slot] {
        self.slots
            .get()
            .expect("struct serializer used before registration completed")
    }

    fn default_ref(&self) -> &R {
        self.default.get_or_init(R::default)
    }

    /// The unrecognized payload owned by this serializer, if any.
    fn own_unrecognized<'a>(&self, value: &'a R) -> Option<&'a UnrecognizedFields> {
        (self.get_unrecognized)(value).filter(|u| u.token == self.token)
    }

    /// Written length: one past the last non-default field.
    fn content_len(&self, value: &R) -> usize {
        let mut len = 0;
        for field in &self.fields {
            if !field.ops.is_default(value) {
                len = field.number as usize + 1;
            }
        }
        len
    }
}

impl<R: Record> Codec<R> for StructCodec<R> {
    fn encode(&self, value: &R, w: &mut Writer) {
        let slots = self.slots();
        let unrecognized = self.own_unrecognized(value).and_then(|u| match &u.payload {
            FieldsPayload::Bytes(raw) => Some((u.total_slots, raw)),
            FieldsPayload::Json(_) => None,
        });
        let len = match unrecognized {
            Some((total_slots, _)) => total_slots,
            None => self.content_len(value),
        };
        wire::encode_struct_len(w, len);
        for slot in &slots[..len.min(slots.len())] {
            match slot {
                Slot::Field(index) => {
                    let field = &self.fields[*index];
                    if field.ops.is_default(value) {
                        w.put_u8(0);
                    } else {
                        field.ops.encode(value, w);
                    }
                }
                Slot::Unused => w.put_u8(0),
            }
        }
        if let Some((_, raw)) = unrecognized {
            w.put_slice(raw);
        }
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<R, DecodeError> {
        let slots = self.slots();
        let len = wire::decode_array_len(r)?;
        if len == 0 {
            return Ok(self.default_ref().clone());
        }
        let mut record = self.default_ref().clone();
        for slot in &slots[..len.min(slots.len())] {
            match slot {
                Slot::Field(index) => self.fields[*index].ops.decode_into(&mut record, r)?,
                Slot::Unused => skip_value(r)?,
            }
        }
        if len > slots.len() {
            if r.keep_unrecognized() {
                let start = r.position();
                for _ in slots.len()..len {
                    skip_value(r)?;
                }
                let raw = Bytes::copy_from_slice(r.slice_since(start));
                (self.set_unrecognized)(
                    &mut record,
                    Some(UnrecognizedFields {
                        token: self.token.clone(),
                        total_slots: len,
                        payload: FieldsPayload::Bytes(raw),
                    }),
                );
            } else {
                for _ in slots.len()..len {
                    skip_value(r)?;
                }
            }
        }
        Ok(record)
    }

    fn to_json(&self, value: &R, flavor: JsonFlavor) -> Value {
        let slots = self.slots();
        match flavor {
            JsonFlavor::Dense => {
                let unrecognized =
                    self.own_unrecognized(value).and_then(|u| match &u.payload {
                        FieldsPayload::Json(values) => Some((u.total_slots, values)),
                        FieldsPayload::Bytes(_) => None,
                    });
                let written = match unrecognized {
                    Some(_) => slots.len(),
                    None => self.content_len(value),
                };
                let mut out = Vec::with_capacity(written);
                for slot in &slots[..written] {
                    out.push(match slot {
                        Slot::Field(index) => {
                            let field = &self.fields[*index];
                            if field.ops.is_default(value) {
                                Value::from(0)
                            } else {
                                field.ops.to_json(value, flavor)
                            }
                        }
                        Slot::Unused => Value::from(0),
                    });
                }
                if let Some((_, values)) = unrecognized {
                    out.extend(values.iter().cloned());
                }
                Value::Array(out)
            }
            JsonFlavor::Readable => {
                let mut out = Map::new();
                for field in &self.fields {
                    if !field.ops.is_default(value) {
                        out.insert(field.name.to_owned(), field.ops.to_json(value, flavor));
                    }
                }
                Value::Object(out)
            }
        }
    }

    fn from_json(&self, value: &Value, mode: DecodeMode) -> Result<R, DecodeError> {
        let slots = self.slots();
        match value {
            Value::Array(items) => {
                let mut record = self.default_ref().clone();
                for (item, slot) in items.iter().zip(slots.iter()) {
                    if let Slot::Field(index) = slot {
                        self.fields[*index].ops.from_json_into(&mut record, item, mode)?;
                    }
                }
                if items.len() > slots.len() && mode == DecodeMode::KeepUnrecognized {
                    (self.set_unrecognized)(
                        &mut record,
                        Some(UnrecognizedFields {
                            token: self.token.clone(),
                            total_slots: items.len(),
                            payload: FieldsPayload::Json(items[slots.len()..].to_vec()),
                        }),
                    );
                }
                Ok(record)
            }
            Value::Object(map) => {
                // Readable form; unknown keys are ignored.
                let mut record = self.default_ref().clone();
                for field in &self.fields {
                    if let Some(item) = map.get(field.name) {
                        field.ops.from_json_into(&mut record, item, mode)?;
                    }
                }
                Ok(record)
            }
            _ if json::is_json_zero(value) => Ok(self.default_ref().clone()),
            _ => Err(json::type_mismatch("array or object", value)),
        }
    }

    fn default_value(&self) -> R {
        self.default_ref().clone()
    }

    fn is_default(&self, value: &R) -> bool {
        (self.get_unrecognized)(value).is_none()
            && self.fields.iter().all(|f| f.ops.is_default(value))
    }

    fn signature(&self) -> TypeSignature {
        TypeSignature::Record(R::record_id())
    }
}

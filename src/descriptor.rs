//! Reflective type descriptors with a JSON round-trip.

use crate::containers::is_valid_key_extractor;
use crate::error::DecodeError;
use crate::json::type_mismatch;
use crate::registry;
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// The closed set of primitive types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveKind {
    Bool,
    Int32,
    Int64,
    Uint64,
    Float32,
    Float64,
    Timestamp,
    String,
    Bytes,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            PrimitiveKind::Bool => "bool",
            PrimitiveKind::Int32 => "int32",
            PrimitiveKind::Int64 => "int64",
            PrimitiveKind::Uint64 => "uint64",
            PrimitiveKind::Float32 => "float32",
            PrimitiveKind::Float64 => "float64",
            PrimitiveKind::Timestamp => "timestamp",
            PrimitiveKind::String => "string",
            PrimitiveKind::Bytes => "bytes",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "bool" => PrimitiveKind::Bool,
            "int32" => PrimitiveKind::Int32,
            "int64" => PrimitiveKind::Int64,
            "uint64" => PrimitiveKind::Uint64,
            "float32" => PrimitiveKind::Float32,
            "float64" => PrimitiveKind::Float64,
            "timestamp" => PrimitiveKind::Timestamp,
            "string" => PrimitiveKind::String,
            "bytes" => PrimitiveKind::Bytes,
            _ => return None,
        })
    }
}

/// The shape of a serializable type. Records are referenced by id
/// (`module_path:QualifiedName`) so that recursive schemas stay acyclic in
/// memory.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeSignature {
    Primitive(PrimitiveKind),
    Optional(Box<TypeSignature>),
    Array {
        item: Box<TypeSignature>,
        key_extractor: Option<String>,
    },
    Record(String),
}

impl TypeSignature {
    pub fn to_json(&self) -> Value {
        match self {
            TypeSignature::Primitive(kind) => {
                json!({"kind": "primitive", "value": kind.name()})
            }
            TypeSignature::Optional(inner) => {
                json!({"kind": "optional", "value": inner.to_json()})
            }
            TypeSignature::Array {
                item,
                key_extractor,
            } => {
                let mut value = Map::new();
                value.insert("item".to_owned(), item.to_json());
                if let Some(path) = key_extractor {
                    value.insert("key_extractor".to_owned(), Value::String(path.clone()));
                }
                json!({"kind": "array", "value": value})
            }
            TypeSignature::Record(id) => json!({"kind": "record", "value": id}),
        }
    }

    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        let obj = value
            .as_object()
            .ok_or_else(|| type_mismatch("type object", value))?;
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| type_mismatch("type kind", value))?;
        let inner = obj.get("value").unwrap_or(&Value::Null);
        match kind {
            "primitive" => {
                let name = inner
                    .as_str()
                    .ok_or_else(|| type_mismatch("primitive name", inner))?;
                PrimitiveKind::from_name(name)
                    .map(TypeSignature::Primitive)
                    .ok_or_else(|| DecodeError::TypeMismatch {
                        expected: "primitive name",
                        actual: name.to_owned(),
                    })
            }
            "optional" => Ok(TypeSignature::Optional(Box::new(Self::from_json(inner)?))),
            "array" => {
                let obj = inner
                    .as_object()
                    .ok_or_else(|| type_mismatch("array type", inner))?;
                let item = obj
                    .get("item")
                    .ok_or_else(|| type_mismatch("array item type", inner))?;
                let key_extractor = match obj.get("key_extractor") {
                    None | Some(Value::Null) => None,
                    Some(Value::String(path)) => {
                        if !is_valid_key_extractor(path) {
                            return Err(DecodeError::InvalidKeyExtractor(path.clone()));
                        }
                        Some(path.clone())
                    }
                    Some(other) => return Err(type_mismatch("key extractor", other)),
                };
                Ok(TypeSignature::Array {
                    item: Box::new(Self::from_json(item)?),
                    key_extractor,
                })
            }
            "record" => {
                let id = inner
                    .as_str()
                    .ok_or_else(|| type_mismatch("record id", inner))?;
                Ok(TypeSignature::Record(id.to_owned()))
            }
            other => Err(DecodeError::TypeMismatch {
                expected: "type kind",
                actual: other.to_owned(),
            }),
        }
    }
}

/// Registration-time check that every key extractor reachable from a field
/// signature is lexically valid.
pub(crate) fn validate_key_extractors(
    signature: &TypeSignature,
) -> Result<(), crate::error::RegistrationError> {
    match signature {
        TypeSignature::Array {
            item,
            key_extractor,
        } => {
            if let Some(path) = key_extractor {
                if !is_valid_key_extractor(path) {
                    return Err(crate::error::RegistrationError::InvalidKeyExtractor(
                        path.clone(),
                    ));
                }
            }
            validate_key_extractors(item)
        }
        TypeSignature::Optional(inner) => validate_key_extractors(inner),
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordKind {
    Struct,
    Enum,
}

/// One field of a struct, or one variant of an enum. Enum constants carry
/// no signature; the implicit UNKNOWN variant is never listed.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub number: u32,
    pub signature: Option<TypeSignature>,
}

/// Definition of one struct or enum.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDescriptor {
    pub kind: RecordKind,
    pub id: String,
    pub fields: Vec<FieldDescriptor>,
    pub removed_numbers: Vec<u32>,
}

impl RecordDescriptor {
    /// The `module_path` half of the id.
    pub fn module_path(&self) -> &str {
        self.id.split_once(':').map_or("", |(m, _)| m)
    }

    /// The `QualifiedName` half of the id.
    pub fn qualified_name(&self) -> &str {
        self.id.split_once(':').map_or(self.id.as_str(), |(_, n)| n)
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.number == number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// `max(max_active_number, max_removed_number) + 1`: how many leading
    /// slots a decoder consumes through the schema rather than the skipper.
    pub fn recognized_slots(&self) -> usize {
        let active = self.fields.iter().map(|f| f.number + 1).max().unwrap_or(0);
        let removed = self
            .removed_numbers
            .iter()
            .map(|n| n + 1)
            .max()
            .unwrap_or(0);
        active.max(removed) as usize
    }

    pub fn to_json(&self) -> Value {
        let kind = match self.kind {
            RecordKind::Struct => "struct",
            RecordKind::Enum => "enum",
        };
        let fields: Vec<Value> = self
            .fields
            .iter()
            .map(|f| {
                let mut obj = Map::new();
                obj.insert("name".to_owned(), Value::String(f.name.clone()));
                obj.insert("number".to_owned(), Value::from(f.number));
                if let Some(signature) = &f.signature {
                    obj.insert("type".to_owned(), signature.to_json());
                }
                Value::Object(obj)
            })
            .collect();
        let mut obj = Map::new();
        obj.insert("kind".to_owned(), Value::String(kind.to_owned()));
        obj.insert("id".to_owned(), Value::String(self.id.clone()));
        obj.insert("fields".to_owned(), Value::Array(fields));
        if !self.removed_numbers.is_empty() {
            obj.insert(
                "removed_fields".to_owned(),
                Value::Array(self.removed_numbers.iter().map(|n| Value::from(*n)).collect()),
            );
        }
        Value::Object(obj)
    }

    pub fn from_json(value: &Value) -> Result<Self, DecodeError> {
        let obj = value
            .as_object()
            .ok_or_else(|| type_mismatch("record object", value))?;
        let kind = match obj.get("kind").and_then(Value::as_str) {
            Some("struct") => RecordKind::Struct,
            Some("enum") => RecordKind::Enum,
            _ => return Err(type_mismatch("record kind", value)),
        };
        let id = obj
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| type_mismatch("record id", value))?
            .to_owned();
        let mut fields = Vec::new();
        for field in obj
            .get("fields")
            .and_then(Value::as_array)
            .ok_or_else(|| type_mismatch("record fields", value))?
        {
            let field_obj = field
                .as_object()
                .ok_or_else(|| type_mismatch("field object", field))?;
            let name = field_obj
                .get("name")
                .and_then(Value::as_str)
                .ok_or_else(|| type_mismatch("field name", field))?
                .to_owned();
            let number = field_obj
                .get("number")
                .and_then(Value::as_u64)
                .ok_or_else(|| type_mismatch("field number", field))? as u32;
            let signature = match field_obj.get("type") {
                None => None,
                Some(t) => Some(TypeSignature::from_json(t)?),
            };
            fields.push(FieldDescriptor {
                name,
                number,
                signature,
            });
        }
        let removed_numbers = match obj.get("removed_fields") {
            None => Vec::new(),
            Some(Value::Array(numbers)) => numbers
                .iter()
                .map(|n| {
                    n.as_u64()
                        .map(|n| n as u32)
                        .ok_or_else(|| type_mismatch("removed number", n))
                })
                .collect::<Result<_, _>>()?,
            Some(other) => return Err(type_mismatch("removed numbers", other)),
        };
        Ok(Self {
            kind,
            id,
            fields,
            removed_numbers,
        })
    }
}

/// A serializer's reflective mirror: the root type signature plus the
/// transitive closure of every struct/enum definition it references.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    signature: TypeSignature,
    records: BTreeMap<String, Arc<RecordDescriptor>>,
}

impl TypeDescriptor {
    pub(crate) fn new(
        signature: TypeSignature,
        records: BTreeMap<String, Arc<RecordDescriptor>>,
    ) -> Self {
        Self { signature, records }
    }

    /// Builds the descriptor for a registered type by collecting referenced
    /// record definitions from the global registry.
    pub(crate) fn for_signature(signature: TypeSignature) -> Self {
        let mut records = BTreeMap::new();
        collect_records(&signature, &mut records);
        Self { signature, records }
    }

    pub fn signature(&self) -> &TypeSignature {
        &self.signature
    }

    pub fn record(&self, id: &str) -> Option<&RecordDescriptor> {
        self.records.get(id).map(Arc::as_ref)
    }

    pub(crate) fn records(&self) -> &BTreeMap<String, Arc<RecordDescriptor>> {
        &self.records
    }

    /// JSON export: `{"type": ..., "records": [...]}` with records in
    /// deterministic id order.
    pub fn as_json(&self) -> Value {
        json!({
            "type": self.signature.to_json(),
            "records": self.records.values().map(|r| r.to_json()).collect::<Vec<_>>(),
        })
    }

    pub fn as_json_code(&self) -> String {
        let json = self.as_json();
        serde_json::to_string_pretty(&json).unwrap_or_else(|_| json.to_string())
    }
}

fn collect_records(
    signature: &TypeSignature,
    out: &mut BTreeMap<String, Arc<RecordDescriptor>>,
) {
    match signature {
        TypeSignature::Primitive(_) => {}
        TypeSignature::Optional(inner) => collect_records(inner, out),
        TypeSignature::Array { item, .. } => collect_records(item, out),
        TypeSignature::Record(id) => {
            if out.contains_key(id) {
                return;
            }
            let descriptor = registry::record_descriptor(id).unwrap_or_else(|| {
                panic!("record {id} referenced before its module was initialized")
            });
            out.insert(id.clone(), descriptor.clone());
            for field in &descriptor.fields {
                if let Some(signature) = &field.signature {
                    collect_records(signature, out);
                }
            }
        }
    }
}

/// Rebuilds a fully-wired [`TypeDescriptor`] from its JSON export.
pub fn parse_type_descriptor(value: &Value) -> Result<TypeDescriptor, DecodeError> {
    let obj = value
        .as_object()
        .ok_or_else(|| type_mismatch("type descriptor", value))?;
    let signature = TypeSignature::from_json(
        obj.get("type")
            .ok_or_else(|| type_mismatch("type descriptor", value))?,
    )?;
    let mut records = BTreeMap::new();
    if let Some(list) = obj.get("records") {
        let list = list
            .as_array()
            .ok_or_else(|| type_mismatch("records array", list))?;
        for record in list {
            let descriptor = RecordDescriptor::from_json(record)?;
            records.insert(descriptor.id.clone(), Arc::new(descriptor));
        }
    }
    let descriptor = TypeDescriptor::new(signature, records);
    validate_signature(descriptor.signature(), &descriptor)?;
    for record in descriptor.records().values() {
        for field in &record.fields {
            if let Some(signature) = &field.signature {
                validate_signature(signature, &descriptor)?;
            }
        }
    }
    Ok(descriptor)
}

fn validate_signature(
    signature: &TypeSignature,
    descriptor: &TypeDescriptor,
) -> Result<(), DecodeError> {
    match signature {
        TypeSignature::Primitive(_) => Ok(()),
        TypeSignature::Optional(inner) => validate_signature(inner, descriptor),
        TypeSignature::Array { item, .. } => validate_signature(item, descriptor),
        TypeSignature::Record(id) => {
            if descriptor.record(id).is_none() {
                return Err(DecodeError::UnknownRecord(id.clone()));
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_descriptor() -> RecordDescriptor {
        RecordDescriptor {
            kind: RecordKind::Struct,
            id: "geo/shapes.soia:Point".to_owned(),
            fields: vec![
                FieldDescriptor {
                    name: "x".to_owned(),
                    number: 0,
                    signature: Some(TypeSignature::Primitive(PrimitiveKind::Int32)),
                },
                FieldDescriptor {
                    name: "y".to_owned(),
                    number: 1,
                    signature: Some(TypeSignature::Primitive(PrimitiveKind::Int32)),
                },
            ],
            removed_numbers: vec![2],
        }
    }

    #[test]
    fn test_record_id_halves() {
        let d = point_descriptor();
        assert_eq!(d.module_path(), "geo/shapes.soia");
        assert_eq!(d.qualified_name(), "Point");
    }

    #[test]
    fn test_recognized_slots_includes_removed() {
        let d = point_descriptor();
        assert_eq!(d.recognized_slots(), 3);
    }

    #[test]
    fn test_signature_json_roundtrip() {
        let signatures = [
            TypeSignature::Primitive(PrimitiveKind::Timestamp),
            TypeSignature::Optional(Box::new(TypeSignature::Primitive(PrimitiveKind::Bool))),
            TypeSignature::Array {
                item: Box::new(TypeSignature::Record("m:R".to_owned())),
                key_extractor: Some("user.id".to_owned()),
            },
        ];
        for signature in signatures {
            assert_eq!(
                TypeSignature::from_json(&signature.to_json()).unwrap(),
                signature
            );
        }
    }

    #[test]
    fn test_descriptor_json_roundtrip() {
        let record = point_descriptor();
        let mut records = BTreeMap::new();
        records.insert(record.id.clone(), Arc::new(record.clone()));
        let descriptor =
            TypeDescriptor::new(TypeSignature::Record(record.id.clone()), records);
        let json = descriptor.as_json();
        let parsed = parse_type_descriptor(&json).unwrap();
        assert_eq!(parsed.as_json(), json);
    }

    #[test]
    fn test_parse_rejects_dangling_record() {
        let json = serde_json::json!({
            "type": {"kind": "record", "value": "m:Missing"},
            "records": [],
        });
        assert!(matches!(
            parse_type_descriptor(&json),
            Err(DecodeError::UnknownRecord(_))
        ));
    }

    #[test]
    fn test_parse_rejects_bad_key_extractor() {
        let json = serde_json::json!({
            "type": {"kind": "array", "value": {
                "item": {"kind": "primitive", "value": "int32"},
                "key_extractor": "Bad.Path",
            }},
            "records": [],
        });
        assert!(matches!(
            parse_type_descriptor(&json),
            Err(DecodeError::InvalidKeyExtractor(_))
        ));
    }

    #[test]
    fn test_enum_constant_field_omits_type() {
        let record = RecordDescriptor {
            kind: RecordKind::Enum,
            id: "m:Weekday".to_owned(),
            fields: vec![FieldDescriptor {
                name: "MONDAY".to_owned(),
                number: 1,
                signature: None,
            }],
            removed_numbers: Vec::new(),
        };
        let json = record.to_json();
        assert!(json["fields"][0].get("type").is_none());
        assert_eq!(RecordDescriptor::from_json(&json).unwrap(), record);
    }
}

//! Global record registry and the two-pass module registration protocol.
//!
//! Generated code calls [`init_module`] once per schema module. Pass 1
//! inserts every record's serializer handle so that sibling records can
//! resolve each other; pass 2 wires field serializers and freezes the
//! definitions. The two passes are what allow mutually recursive records
//! within a module. Modules must be initialised after the modules they
//! import.

use crate::descriptor::RecordDescriptor;
use crate::error::RegistrationError;
use crate::serializer::Serializer;
use parking_lot::RwLock;
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

/// Implemented by generated record types (structs and enums).
pub trait Record: Clone + Default + PartialEq + std::fmt::Debug + Send + Sync + 'static {
    const MODULE_PATH: &'static str;
    const QUALIFIED_NAME: &'static str;

    /// The registry identity: `module_path:QualifiedName`.
    fn record_id() -> String {
        format!("{}:{}", Self::MODULE_PATH, Self::QUALIFIED_NAME)
    }

    /// The serializer registered for this record.
    ///
    /// # Panics
    ///
    /// Panics if called before the record's module was initialised;
    /// registration must complete before any serialization begins.
    fn serializer() -> Serializer<Self> {
        serializer_for::<Self>()
    }
}

/// A record definition produced by a struct or enum builder, consumed by
/// [`init_module`].
pub struct RecordDef(pub(crate) Box<dyn ErasedRecordDef>);

/// Type-erased two-phase record initialisation.
pub(crate) trait ErasedRecordDef: Send {
    fn module_path(&self) -> &'static str;
    fn id(&self) -> String;
    /// Pass 1: creates the codec and returns the boxed `Serializer<R>`.
    fn create_serializer(&mut self) -> Box<dyn Any + Send + Sync>;
    /// Pass 2: wires field serializers, validates, freezes, and returns the
    /// record's reflective definition.
    fn finish(&mut self) -> Result<RecordDescriptor, RegistrationError>;
}

struct RegistryEntry {
    serializer: Box<dyn Any + Send + Sync>,
    descriptor: Option<Arc<RecordDescriptor>>,
}

static REGISTRY: OnceLock<RwLock<HashMap<String, RegistryEntry>>> = OnceLock::new();

fn registry() -> &'static RwLock<HashMap<String, RegistryEntry>> {
    REGISTRY.get_or_init(|| RwLock::new(HashMap::new()))
}

/// Registers every record of a schema module. A record identity may only
/// ever be registered once; on error nothing from this call stays
/// registered.
pub fn init_module(
    module_path: &'static str,
    records: Vec<RecordDef>,
) -> Result<(), RegistrationError> {
    let mut defs: Vec<Box<dyn ErasedRecordDef>> = records.into_iter().map(|r| r.0).collect();
    let ids: Vec<String> = defs.iter().map(|def| def.id()).collect();

    // Validate identities up front so pass 1 cannot partially apply.
    {
        let reg = registry().read();
        let mut seen = HashSet::new();
        for (def, id) in defs.iter().zip(&ids) {
            if def.module_path() != module_path {
                return Err(RegistrationError::ModuleMismatch {
                    record: id.clone(),
                    module: module_path,
                });
            }
            if reg.contains_key(id) || !seen.insert(id.clone()) {
                return Err(RegistrationError::DuplicateRecord(id.clone()));
            }
        }
    }

    // Pass 1: allocate serializer handles.
    {
        let mut reg = registry().write();
        for def in &mut defs {
            reg.insert(
                def.id(),
                RegistryEntry {
                    serializer: def.create_serializer(),
                    descriptor: None,
                },
            );
        }
    }

    // Pass 2: wire and freeze. The registry lock must not be held here:
    // wiring resolves sibling records through `serializer_for`.
    let mut descriptors = Vec::with_capacity(defs.len());
    for (def, id) in defs.iter_mut().zip(&ids) {
        match def.finish() {
            Ok(descriptor) => descriptors.push((id.clone(), descriptor)),
            Err(e) => {
                let mut reg = registry().write();
                for id in &ids {
                    reg.remove(id);
                }
                return Err(e);
            }
        }
    }

    let mut reg = registry().write();
    for (id, descriptor) in descriptors {
        if let Some(entry) = reg.get_mut(&id) {
            entry.descriptor = Some(Arc::new(descriptor));
        }
    }
    Ok(())
}

pub(crate) fn serializer_for<R: Record>() -> Serializer<R> {
    let reg = registry().read();
    let id = R::record_id();
    let entry = reg
        .get(&id)
        .unwrap_or_else(|| panic!("record {id} used before its module was initialized"));
    entry
        .serializer
        .downcast_ref::<Serializer<R>>()
        .unwrap_or_else(|| panic!("record {id} registered with a different Rust type"))
        .clone()
}

/// The frozen definition of a registered record, if any.
pub(crate) fn record_descriptor(id: &str) -> Option<Arc<RecordDescriptor>> {
    registry().read().get(id)?.descriptor.clone()
}

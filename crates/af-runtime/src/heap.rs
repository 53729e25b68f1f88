//! Shared object heap.
//!
//! Objects are append-only and addressed by [`ObjId`]. Each object sits behind
//! an `Arc`, so callers can keep using an object after releasing the heap lock.

use std::collections::BTreeMap;
use std::fmt;

use af_core::{PrimitiveKind, StructureId};
use tracing::trace;

use crate::error::ExecError;
use crate::sync::{Arc, AtomicU64, Mutex, Ordering, RwLock};
use crate::value::{ObjId, Value};

/// Atomic single-reference cell backing a lazy field.
///
/// The slot holds `0` while empty and `id + 1` once a reference is stored.
/// Stores publish with `Release` and loads observe with `Acquire`, so a reader
/// that sees a reference also sees the object it points to. The monitor is
/// what `synchronized` on this object acquires.
pub struct AtomicHolder {
    slot: AtomicU64,
    monitor: Mutex<()>,
}

impl AtomicHolder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            slot: AtomicU64::new(0),
            monitor: Mutex::new(()),
        }
    }

    /// Current reference, `None` while empty.
    #[must_use]
    pub fn get(&self) -> Option<ObjId> {
        match self.slot.load(Ordering::Acquire) {
            0 => None,
            encoded => Some(ObjId((encoded - 1) as u32)),
        }
    }

    pub fn set(&self, value: Option<ObjId>) {
        let encoded = value.map_or(0, |id| u64::from(id.0) + 1);
        self.slot.store(encoded, Ordering::Release);
    }

    pub(crate) fn monitor(&self) -> &Mutex<()> {
        &self.monitor
    }
}

impl Default for AtomicHolder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AtomicHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AtomicHolder").field("slot", &self.get()).finish()
    }
}

/// An instance of a tree structure.
pub struct Instance {
    pub structure: StructureId,
    fields: RwLock<BTreeMap<String, Value>>,
}

impl Instance {
    pub(crate) fn new(structure: StructureId) -> Self {
        Self {
            structure,
            fields: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn field(&self, name: &str) -> Result<Value, ExecError> {
        let fields = self.fields.read().map_err(|_| ExecError::Poisoned)?;
        fields
            .get(name)
            .copied()
            .ok_or_else(|| ExecError::UnknownField(name.to_string()))
    }

    pub(crate) fn init_field(&self, name: &str, value: Value) -> Result<(), ExecError> {
        let mut fields = self.fields.write().map_err(|_| ExecError::Poisoned)?;
        fields.insert(name.to_string(), value);
        Ok(())
    }
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance").field("structure", &self.structure).finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub enum HeapObject {
    Holder(AtomicHolder),
    /// A boxed primitive. Boxing always allocates, so identity differs per box.
    Boxed(Value),
    Str(String),
    Instance(Instance),
}

impl HeapObject {
    /// Type name for diagnostics.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            HeapObject::Holder(_) => af_core::markers::ATOMIC_REFERENCE.to_string(),
            HeapObject::Boxed(value) => value
                .primitive_kind()
                .map_or("?", PrimitiveKind::boxed_name)
                .to_string(),
            HeapObject::Str(_) => "java.lang.String".to_string(),
            HeapObject::Instance(instance) => format!("instance of {}", instance.structure),
        }
    }
}

/// Append-only object store shared by every executing thread.
pub struct Heap {
    objects: RwLock<Vec<Arc<HeapObject>>>,
}

impl Heap {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
        }
    }

    pub fn alloc(&self, object: HeapObject) -> Result<ObjId, ExecError> {
        let mut objects = self.objects.write().map_err(|_| ExecError::Poisoned)?;
        let id = ObjId(objects.len() as u32);
        trace!(object = %id, kind = %object.type_name(), "alloc");
        objects.push(Arc::new(object));
        Ok(id)
    }

    pub fn get(&self, id: ObjId) -> Result<Arc<HeapObject>, ExecError> {
        let objects = self.objects.read().map_err(|_| ExecError::Poisoned)?;
        objects.get(id.index()).cloned().ok_or(ExecError::DanglingRef(id))
    }

    /// Box a primitive; references and `null` pass through.
    pub fn box_value(&self, value: Value) -> Result<Value, ExecError> {
        if value.primitive_kind().is_none() {
            return Ok(value);
        }
        Ok(Value::Ref(self.alloc(HeapObject::Boxed(value))?))
    }

    pub fn alloc_str(&self, s: impl Into<String>) -> Result<Value, ExecError> {
        Ok(Value::Ref(self.alloc(HeapObject::Str(s.into()))?))
    }

    /// Contents of a string object, `None` for `null`.
    pub fn read_str(&self, value: Value) -> Result<Option<String>, ExecError> {
        let Some(id) = value.as_obj() else {
            return match value {
                Value::Null => Ok(None),
                other => Err(ExecError::NotAnObject(other.to_string())),
            };
        };
        match &*self.get(id)? {
            HeapObject::Str(s) => Ok(Some(s.clone())),
            other => Err(ExecError::ClassCast {
                expected: "java.lang.String".to_string(),
                found: other.type_name(),
            }),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.objects.read().map(|objects| objects.len()).unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Heap {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Heap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Heap").field("objects", &self.len()).finish()
    }
}

//! Type metadata declared by a recording
//!
//! Every event and every constant pool element is described by a
//! [`TypeDescriptor`]. Event values and pool entries are decoded against the
//! descriptor of their type; descriptors are shared behind an `Arc` so that
//! name and category lookups happen once per type, not once per event.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{RecordingError, Result};

/// Numeric identifier of a declared type
pub type TypeId = u64;

/// Declared kind of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    Boolean,
    Long,
    Double,
    String,
    /// Key into the constant pool of the given type
    Constant(TypeId),
}

/// A single declared field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
    /// Whether the field holds a sequence of `kind` values
    pub array: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            array: false,
        }
    }

    pub fn array(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            array: true,
        }
    }

    /// The pool type this field points into, if any
    pub fn constant_type(&self) -> Option<TypeId> {
        match self.kind {
            FieldKind::Constant(id) => Some(id),
            _ => None,
        }
    }
}

/// Schema of an event type or a constant pool element type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub id: TypeId,

    /// Fully qualified name, e.g. `example.Tiger`
    pub name: String,

    /// Category path, outermost label first
    pub categories: Vec<String>,

    pub fields: Vec<FieldDescriptor>,

    /// Whether records of this type appear in the event stream
    pub is_event: bool,
}

/// Events share their descriptor
pub type EventType = TypeDescriptor;

impl TypeDescriptor {
    /// Declare an event type
    pub fn event(id: TypeId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            categories: Vec::new(),
            fields: Vec::new(),
            is_event: true,
        }
    }

    /// Declare a constant pool element type
    pub fn constant(id: TypeId, name: impl Into<String>) -> Self {
        Self {
            is_event: false,
            ..Self::event(id, name)
        }
    }

    pub fn with_category(mut self, label: impl Into<String>) -> Self {
        self.categories.push(label.into());
        self
    }

    pub fn with_field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Name without its dotted prefix (`example.Tiger` -> `Tiger`)
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|f| f.name == name)
    }
}

/// The metadata record of a recording
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub types: Vec<TypeDescriptor>,

    /// Pool type holding thread objects (each with a `name` string field)
    pub thread_type: Option<TypeId>,
}

/// Validated, shared view of a recording's metadata
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    by_id: BTreeMap<TypeId, Arc<TypeDescriptor>>,
    thread_type: Option<TypeId>,
}

impl TypeRegistry {
    /// Build the registry, rejecting duplicate ids and dangling type references.
    ///
    /// `record` is the index of the metadata record, used in error reports.
    pub fn from_metadata(metadata: &Metadata, record: u64) -> Result<Self> {
        let mut by_id = BTreeMap::new();
        for descriptor in &metadata.types {
            if by_id
                .insert(descriptor.id, Arc::new(descriptor.clone()))
                .is_some()
            {
                return Err(RecordingError::malformed(
                    record,
                    format!("type id {} declared twice", descriptor.id),
                ));
            }
        }

        for descriptor in by_id.values() {
            for field in &descriptor.fields {
                if let Some(target) = field.constant_type() {
                    match by_id.get(&target) {
                        Some(t) if !t.is_event => {}
                        _ => {
                            return Err(RecordingError::malformed(
                                record,
                                format!(
                                    "field {}.{} references undeclared pool type {}",
                                    descriptor.name, field.name, target
                                ),
                            ))
                        }
                    }
                }
            }
        }

        if let Some(thread_type) = metadata.thread_type {
            let valid = by_id.get(&thread_type).is_some_and(|t| {
                !t.is_event
                    && t.fields
                        .iter()
                        .any(|f| f.name == "name" && f.kind == FieldKind::String && !f.array)
            });
            if !valid {
                return Err(RecordingError::malformed(
                    record,
                    format!("thread type {} is not a pool type with a name field", thread_type),
                ));
            }
        }

        Ok(Self {
            by_id,
            thread_type: metadata.thread_type,
        })
    }

    pub fn get(&self, id: TypeId) -> Option<&Arc<TypeDescriptor>> {
        self.by_id.get(&id)
    }

    pub fn thread_type(&self) -> Option<TypeId> {
        self.thread_type
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.by_id.values()
    }

    pub fn event_types(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.by_id.values().filter(|t| t.is_event)
    }

    /// Rebuild the wire form of the metadata
    pub fn to_metadata(&self) -> Metadata {
        Metadata {
            types: self.by_id.values().map(|t| t.as_ref().clone()).collect(),
            thread_type: self.thread_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_type() -> TypeDescriptor {
        TypeDescriptor::constant(1, "thread").with_field(FieldDescriptor::new("name", FieldKind::String))
    }

    #[test]
    fn test_simple_name() {
        assert_eq!(TypeDescriptor::event(10, "example.Tiger").simple_name(), "Tiger");
        assert_eq!(TypeDescriptor::event(11, "Zebra").simple_name(), "Zebra");
    }

    #[test]
    fn test_registry_accepts_valid_metadata() {
        let metadata = Metadata {
            types: vec![
                thread_type(),
                TypeDescriptor::event(10, "example.Tiger")
                    .with_category("Mammal")
                    .with_field(FieldDescriptor::new("prey", FieldKind::Constant(1))),
            ],
            thread_type: Some(1),
        };
        let registry = TypeRegistry::from_metadata(&metadata, 0).unwrap();
        assert_eq!(registry.event_types().count(), 1);
        assert_eq!(registry.thread_type(), Some(1));
        assert_eq!(registry.to_metadata(), metadata);
    }

    #[test]
    fn test_registry_rejects_duplicate_ids() {
        let metadata = Metadata {
            types: vec![thread_type(), thread_type()],
            thread_type: None,
        };
        assert!(matches!(
            TypeRegistry::from_metadata(&metadata, 0),
            Err(RecordingError::MalformedRecord { .. })
        ));
    }

    #[test]
    fn test_registry_rejects_dangling_constant_field() {
        let metadata = Metadata {
            types: vec![TypeDescriptor::event(10, "example.Tiger")
                .with_field(FieldDescriptor::new("stackTrace", FieldKind::Constant(99)))],
            thread_type: None,
        };
        assert!(TypeRegistry::from_metadata(&metadata, 0).is_err());
    }

    #[test]
    fn test_registry_rejects_thread_type_without_name() {
        let metadata = Metadata {
            types: vec![TypeDescriptor::constant(1, "thread")],
            thread_type: Some(1),
        };
        assert!(TypeRegistry::from_metadata(&metadata, 0).is_err());
    }
}

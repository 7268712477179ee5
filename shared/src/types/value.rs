//! Resolved field values and pool objects

use std::sync::Arc;

use super::metadata::TypeDescriptor;
use super::reference::Reference;

/// A decoded field value
///
/// Constant pool fields decode to [`Value::Ref`], never to the target object
/// itself, so object graphs may be cyclic.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    Ref(Reference),
    Array(Vec<Value>),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_reference(&self) -> Option<&Reference> {
        match self {
            Value::Ref(r) => Some(r),
            _ => None,
        }
    }

    /// Equality for pool bindings: doubles compare by bit pattern, so a
    /// `NaN` field equals itself.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Double(a), Value::Double(b)) => a.to_bits() == b.to_bits(),
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.same_as(y))
            }
            _ => self == other,
        }
    }

    /// Visit every reference held directly by this value (arrays included).
    pub fn for_each_reference<F: FnMut(&Reference)>(&self, f: &mut F) {
        match self {
            Value::Ref(r) => f(r),
            Value::Array(items) => items.iter().for_each(|v| v.for_each_reference(f)),
            _ => {}
        }
    }
}

/// An entry of a constant pool
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedObject {
    descriptor: Arc<TypeDescriptor>,
    values: Vec<Value>,
}

impl RecordedObject {
    pub fn new(descriptor: Arc<TypeDescriptor>, values: Vec<Value>) -> Self {
        Self { descriptor, values }
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.descriptor
            .field_index(field)
            .and_then(|i| self.values.get(i))
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.get(field).and_then(Value::as_str)
    }

    /// [`Value::same_as`] over every field, same type required
    pub fn same_as(&self, other: &RecordedObject) -> bool {
        self.descriptor == other.descriptor
            && self.values.len() == other.values.len()
            && self.values.iter().zip(&other.values).all(|(a, b)| a.same_as(b))
    }

    pub fn for_each_reference<F: FnMut(&Reference)>(&self, mut f: F) {
        self.values.iter().for_each(|v| v.for_each_reference(&mut f));
    }
}

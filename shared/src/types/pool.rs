//! Constant pools
//!
//! A constant pool maps numeric keys to objects of one type. Loading is a
//! two-phase protocol: every key is first [registered](ConstantPool::register)
//! as a pending slot, then [bound](ConstantPool::bind) to its decoded object.
//! Because field values hold [`Reference`]s rather than objects, an entry may
//! point at keys that are still pending, including its own.

use std::collections::BTreeMap;
use std::sync::Arc;

use super::metadata::{TypeDescriptor, TypeId};
use super::reference::Reference;
use super::value::RecordedObject;
use crate::error::{RecordingError, Result};

/// Key of an entry within one pool
pub type PoolKey = u64;

#[derive(Debug, Clone)]
enum Slot {
    Pending,
    Bound(RecordedObject),
}

/// Key -> object table for a single type
#[derive(Debug, Clone)]
pub struct ConstantPool {
    name: Arc<str>,
    type_id: TypeId,
    slots: BTreeMap<PoolKey, Slot>,
}

impl ConstantPool {
    pub fn new(name: impl Into<Arc<str>>, type_id: TypeId) -> Self {
        Self {
            name: name.into(),
            type_id,
            slots: BTreeMap::new(),
        }
    }

    pub fn for_type(descriptor: &TypeDescriptor) -> Self {
        Self::new(descriptor.name.as_str(), descriptor.id)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Create a pending slot for `key` if none exists.
    pub fn register(&mut self, key: PoolKey) {
        self.slots.entry(key).or_insert(Slot::Pending);
    }

    /// Fill the slot for `key`.
    ///
    /// Binding an equal object again is accepted (see
    /// [`RecordedObject::same_as`]); a different object is a conflict.
    pub fn bind(&mut self, key: PoolKey, object: RecordedObject) -> Result<()> {
        let pool = &self.name;
        match self.slots.get_mut(&key) {
            None => Err(RecordingError::UnknownKey {
                pool: pool.to_string(),
                key,
            }),
            Some(slot @ Slot::Pending) => {
                *slot = Slot::Bound(object);
                Ok(())
            }
            Some(Slot::Bound(existing)) if existing.same_as(&object) => Ok(()),
            Some(Slot::Bound(_)) => Err(RecordingError::DuplicateBinding {
                pool: pool.to_string(),
                key,
            }),
        }
    }

    pub fn get(&self, key: PoolKey) -> Result<&RecordedObject> {
        match self.slots.get(&key) {
            None => Err(self.unknown(key)),
            Some(Slot::Pending) => Err(RecordingError::UnresolvedReference(
                self.reference(key).to_string(),
            )),
            Some(Slot::Bound(object)) => Ok(object),
        }
    }

    pub fn contains(&self, key: PoolKey) -> bool {
        self.slots.contains_key(&key)
    }

    pub fn is_bound(&self, key: PoolKey) -> bool {
        matches!(self.slots.get(&key), Some(Slot::Bound(_)))
    }

    /// True once every registered key has been bound
    pub fn is_complete(&self) -> bool {
        self.slots.values().all(|s| matches!(s, Slot::Bound(_)))
    }

    /// Build a reference to `key` in this pool (no registration check).
    pub fn reference(&self, key: PoolKey) -> Reference {
        Reference::new(self.name.clone(), self.type_id, key)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = PoolKey> + '_ {
        self.slots.keys().copied()
    }

    /// Bound entries in key order
    pub fn iter(&self) -> impl Iterator<Item = (PoolKey, &RecordedObject)> {
        self.slots.iter().filter_map(|(k, s)| match s {
            Slot::Bound(object) => Some((*k, object)),
            Slot::Pending => None,
        })
    }

    fn unknown(&self, key: PoolKey) -> RecordingError {
        RecordingError::UnknownKey {
            pool: self.name.to_string(),
            key,
        }
    }
}

/// All constant pools of a recording, indexed by element type
#[derive(Debug, Clone, Default)]
pub struct ConstantPools {
    pools: BTreeMap<TypeId, ConstantPool>,
}

impl ConstantPools {
    pub fn new() -> Self {
        Self::default()
    }

    /// The pool for `descriptor`, created empty on first use
    pub fn pool_mut(&mut self, descriptor: &TypeDescriptor) -> &mut ConstantPool {
        self.pools
            .entry(descriptor.id)
            .or_insert_with(|| ConstantPool::for_type(descriptor))
    }

    pub fn get(&self, type_id: TypeId) -> Option<&ConstantPool> {
        self.pools.get(&type_id)
    }

    pub fn get_mut(&mut self, type_id: TypeId) -> Option<&mut ConstantPool> {
        self.pools.get_mut(&type_id)
    }

    /// Resolve through the pool that owns the reference.
    pub fn resolve(&self, reference: &Reference) -> Result<&RecordedObject> {
        match self.pools.get(&reference.type_id()) {
            Some(pool) => pool.get(reference.key()),
            None => Err(RecordingError::UnknownKey {
                pool: reference.pool_name().to_string(),
                key: reference.key(),
            }),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConstantPool> {
        self.pools.values()
    }

    pub fn total_entries(&self) -> usize {
        self.pools.values().map(ConstantPool::len).sum()
    }
}

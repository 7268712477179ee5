//! Deferred constant pool references
//!
//! A [`Reference`] is a `(pool, key)` pair standing in for an object that
//! lives in a constant pool. It never owns its target: resolution goes
//! through the pool every time, which is what allows objects to reference
//! themselves, directly or through other objects, before they are bound.

use std::fmt;
use std::sync::Arc;

use super::metadata::TypeId;
use super::pool::{ConstantPools, PoolKey};
use super::value::RecordedObject;
use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Reference {
    pool: Arc<str>,
    type_id: TypeId,
    key: PoolKey,
}

impl Reference {
    pub fn new(pool: impl Into<Arc<str>>, type_id: TypeId, key: PoolKey) -> Self {
        Self {
            pool: pool.into(),
            type_id,
            key,
        }
    }

    pub fn pool_name(&self) -> &str {
        &self.pool
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn key(&self) -> PoolKey {
        self.key
    }

    /// Look up the object currently bound under this key.
    pub fn resolve<'p>(&self, pools: &'p ConstantPools) -> Result<&'p RecordedObject> {
        pools.resolve(self)
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]", self.pool, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let r = Reference::new("stackTrace", 4, 17);
        assert_eq!(r.to_string(), "stackTrace[17]");
    }

    #[test]
    fn test_references_share_pool_name() {
        let name: Arc<str> = Arc::from("thread");
        let a = Reference::new(name.clone(), 1, 1);
        let b = Reference::new(name, 1, 1);
        assert_eq!(a, b);
        assert_eq!(a.pool_name(), "thread");
    }
}

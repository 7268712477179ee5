//! Constant pool liveness
//!
//! Tracks which pool entries are reachable from retained events. Marking
//! walks the reference graph with an explicit work stack; the live set
//! doubles as the visited set, so self-references and cycles terminate.

use scrubjay_shared::{ConstantPools, PoolKey, RecordedEvent, Reference, Result, TypeId};
use std::collections::{BTreeMap, BTreeSet};

/// Live keys per pool, for one scrub pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LivenessMark {
    live: BTreeMap<TypeId, BTreeSet<PoolKey>>,
}

impl LivenessMark {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the event's thread and everything its fields reach.
    pub fn mark_event(&mut self, event: &RecordedEvent, pools: &ConstantPools) -> Result<()> {
        let mut stack = Vec::new();
        event.for_each_reference(|r| stack.push(r.clone()));
        self.mark_all(stack, pools)
    }

    /// Mark `reference` and everything reachable from it.
    pub fn mark(&mut self, reference: &Reference, pools: &ConstantPools) -> Result<()> {
        self.mark_all(vec![reference.clone()], pools)
    }

    fn mark_all(&mut self, mut stack: Vec<Reference>, pools: &ConstantPools) -> Result<()> {
        while let Some(reference) = stack.pop() {
            if !self
                .live
                .entry(reference.type_id())
                .or_default()
                .insert(reference.key())
            {
                continue;
            }
            let object = pools.resolve(&reference)?;
            object.for_each_reference(|next| {
                if !self.is_live(next.type_id(), next.key()) {
                    stack.push(next.clone());
                }
            });
        }
        Ok(())
    }

    pub fn is_live(&self, type_id: TypeId, key: PoolKey) -> bool {
        self.live
            .get(&type_id)
            .is_some_and(|keys| keys.contains(&key))
    }

    /// Live keys of one pool in ascending order
    pub fn live_keys(&self, type_id: TypeId) -> impl Iterator<Item = PoolKey> + '_ {
        self.live.get(&type_id).into_iter().flatten().copied()
    }

    pub fn count(&self, type_id: TypeId) -> usize {
        self.live.get(&type_id).map_or(0, BTreeSet::len)
    }

    /// Total number of live keys across pools
    pub fn len(&self) -> usize {
        self.live.values().map(BTreeSet::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

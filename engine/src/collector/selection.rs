//! Retained event selection
//!
//! Records the outcome of the decision pass: which events (by ordinal) are
//! kept, and how many events of each type were seen and kept.

use scrubjay_shared::{RecordedEvent, TypeId};
use std::collections::BTreeMap;

/// Seen/kept counters for one event type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeCounts {
    pub read: u64,
    pub retained: u64,
}

/// Decision pass result
#[derive(Debug, Clone, Default)]
pub struct Selection {
    /// Ordinals of retained events, ascending
    retained: Vec<u64>,
    events_read: u64,
    by_type: BTreeMap<TypeId, TypeCounts>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the filter decision for the next event in file order.
    pub fn record(&mut self, event: &RecordedEvent, keep: bool) {
        let counts = self.by_type.entry(event.event_type.id).or_default();
        counts.read += 1;
        self.events_read += 1;
        if keep {
            counts.retained += 1;
            self.retained.push(event.ordinal);
        }
    }

    pub fn is_retained(&self, ordinal: u64) -> bool {
        self.retained.binary_search(&ordinal).is_ok()
    }

    pub fn events_read(&self) -> u64 {
        self.events_read
    }

    pub fn events_retained(&self) -> u64 {
        self.retained.len() as u64
    }

    pub fn counts(&self) -> &BTreeMap<TypeId, TypeCounts> {
        &self.by_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrubjay_shared::TypeDescriptor;
    use std::sync::Arc;

    fn event(ordinal: u64, event_type: &Arc<TypeDescriptor>) -> RecordedEvent {
        RecordedEvent {
            ordinal,
            event_type: event_type.clone(),
            timestamp: ordinal as i64,
            thread: None,
            thread_name: None,
            values: vec![],
        }
    }

    #[test]
    fn test_selection_counts() {
        let tiger = Arc::new(TypeDescriptor::event(10, "example.Tiger"));
        let zebra = Arc::new(TypeDescriptor::event(11, "example.Zebra"));
        let mut selection = Selection::new();

        selection.record(&event(0, &tiger), true);
        selection.record(&event(1, &zebra), false);
        selection.record(&event(2, &tiger), true);
        selection.record(&event(3, &zebra), true);

        assert_eq!(selection.events_read(), 4);
        assert_eq!(selection.events_retained(), 3);
        assert!(selection.is_retained(2));
        assert!(!selection.is_retained(1));
        assert_eq!(selection.counts()[&10], TypeCounts { read: 2, retained: 2 });
        assert_eq!(selection.counts()[&11], TypeCounts { read: 2, retained: 1 });
    }
}

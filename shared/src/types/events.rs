//! Event type definitions for recordings
//!
//! These types represent events after their constant pool fields have been
//! turned into references and their thread has been named.

use std::sync::Arc;

use super::metadata::EventType;
use super::reference::Reference;
use super::value::Value;

/// Timestamp in nanoseconds since the recording's time origin
pub type Timestamp = i64;

/// A decoded event record
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedEvent {
    /// Position among the events of the recording, starting at 0
    pub ordinal: u64,

    pub event_type: Arc<EventType>,

    pub timestamp: Timestamp,

    /// Thread the event was committed on
    pub thread: Option<Reference>,

    /// Name of `thread`, resolved when the event was read
    pub thread_name: Option<String>,

    /// Field values in declaration order
    pub values: Vec<Value>,
}

impl RecordedEvent {
    pub fn name(&self) -> &str {
        &self.event_type.name
    }

    pub fn categories(&self) -> &[String] {
        &self.event_type.categories
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.event_type
            .field_index(field)
            .and_then(|i| self.values.get(i))
    }

    /// Visit the thread reference and every reference in the fields.
    pub fn for_each_reference<F: FnMut(&Reference)>(&self, mut f: F) {
        if let Some(thread) = &self.thread {
            f(thread);
        }
        self.values.iter().for_each(|v| v.for_each_reference(&mut f));
    }
}

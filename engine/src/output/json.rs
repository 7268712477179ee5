//! JSON output
//!
//! Renders events with their constant pool references expanded. Expansion
//! stops at a reference already being expanded on the current path, or past
//! the depth limit; such references are printed as `pool[key]`.

use scrubjay_shared::{ConstantPools, RecordedEvent, RecordedObject, Reference, Value};
use serde_json::{json, Map, Value as Json};
use std::io::Write;

use crate::error::Result;
use crate::filter::FilterRuleSet;
use crate::reader::RecordingReader;

/// Default nesting limit for expanded references
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Render one event.
pub fn event_to_json(event: &RecordedEvent, pools: &ConstantPools, max_depth: usize) -> Json {
    let mut expander = Expander {
        pools,
        max_depth,
        path: Vec::new(),
    };
    let mut fields = Map::new();
    for (field, value) in event.event_type.fields.iter().zip(&event.values) {
        fields.insert(field.name.clone(), expander.value(value));
    }
    json!({
        "type": event.event_type.name,
        "categories": event.event_type.categories,
        "timestamp": event.timestamp,
        "thread": event.thread_name,
        "fields": fields,
    })
}

/// Write every event accepted by `rules` as one JSON document per line.
///
/// Returns the number of events written.
pub fn write_json_lines<R, W>(
    reader: &mut RecordingReader<R>,
    rules: &FilterRuleSet,
    max_depth: usize,
    mut out: W,
) -> Result<u64>
where
    R: std::io::Read,
    W: Write,
{
    let mut written = 0;
    let mut events = reader.events();
    while let Some(event) = events.next() {
        let event = event?;
        if !rules.matches(&event) {
            continue;
        }
        let line = event_to_json(&event, events.pools(), max_depth);
        serde_json::to_writer(&mut out, &line).map_err(std::io::Error::from)?;
        out.write_all(b"\n")?;
        written += 1;
    }
    out.flush()?;
    Ok(written)
}

struct Expander<'a> {
    pools: &'a ConstantPools,
    max_depth: usize,
    path: Vec<Reference>,
}

impl Expander<'_> {
    fn value(&mut self, value: &Value) -> Json {
        match value {
            Value::Null => Json::Null,
            Value::Boolean(v) => json!(v),
            Value::Long(v) => json!(v),
            Value::Double(v) => json!(v),
            Value::String(v) => json!(v),
            Value::Array(items) => Json::Array(items.iter().map(|v| self.value(v)).collect()),
            Value::Ref(r) => self.reference(r),
        }
    }

    fn reference(&mut self, reference: &Reference) -> Json {
        if self.path.len() >= self.max_depth || self.path.contains(reference) {
            return json!(reference.to_string());
        }
        match self.pools.resolve(reference) {
            Ok(object) => {
                self.path.push(reference.clone());
                let rendered = self.object(object);
                self.path.pop();
                rendered
            }
            // unresolvable keys are rejected when the recording is read
            Err(_) => json!(reference.to_string()),
        }
    }

    fn object(&mut self, object: &RecordedObject) -> Json {
        let mut map = Map::new();
        for (field, value) in object.descriptor().fields.iter().zip(object.values()) {
            map.insert(field.name.clone(), self.value(value));
        }
        Json::Object(map)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scrubjay_shared::{FieldDescriptor, FieldKind, TypeDescriptor};
    use std::sync::Arc;

    #[test]
    fn test_cycle_is_cut() {
        let frame = Arc::new(
            TypeDescriptor::constant(2, "frame")
                .with_field(FieldDescriptor::new("method", FieldKind::String))
                .with_field(FieldDescriptor::new("caller", FieldKind::Constant(2))),
        );
        let mut pools = ConstantPools::new();
        let pool = pools.pool_mut(&frame);
        pool.register(1);
        let me = pool.reference(1);
        pool.bind(
            1,
            RecordedObject::new(
                frame.clone(),
                vec![Value::String("run".into()), Value::Ref(me.clone())],
            ),
        )
        .unwrap();

        let event_type = Arc::new(
            TypeDescriptor::event(10, "example.Tiger")
                .with_category("Mammal")
                .with_field(FieldDescriptor::new("top", FieldKind::Constant(2))),
        );
        let event = RecordedEvent {
            ordinal: 0,
            event_type,
            timestamp: 42,
            thread: None,
            thread_name: Some("India".to_string()),
            values: vec![Value::Ref(me)],
        };

        let rendered = event_to_json(&event, &pools, DEFAULT_MAX_DEPTH);
        assert_eq!(rendered["type"], "example.Tiger");
        assert_eq!(rendered["thread"], "India");
        assert_eq!(rendered["fields"]["top"]["method"], "run");
        assert_eq!(rendered["fields"]["top"]["caller"], "frame[1]");
    }
}

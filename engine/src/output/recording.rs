//! Recording writer
//!
//! Writes the header, the metadata record, pool sections, events and the end
//! marker, in that order. Every value is checked against its declared field
//! before it is written, and every constant pool key a pool entry or an
//! event mentions must be written as a pool entry as well; a recording that
//! would contain a dangling reference is refused.

use scrubjay_shared::protocol::wire::{
    Header, PoolEntry, PoolSection, RawEvent, RawValue, Record, RecordCodec,
};
use scrubjay_shared::{
    FieldKind, Metadata, PoolKey, RecordedEvent, RecordedObject, RecordingError, Result,
    TypeDescriptor, TypeId, TypeRegistry, Value,
};
use std::collections::{BTreeMap, BTreeSet};
use std::io::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Pools,
    Events,
}

/// Sequential writer for one recording
pub struct RecordingWriter<W: Write> {
    out: W,
    codec: RecordCodec,
    types: TypeRegistry,
    stage: Stage,
    next_record: u64,
    written: BTreeMap<TypeId, BTreeSet<PoolKey>>,
    /// Keys mentioned by pool entries, checked once all pools are written
    pending: Vec<(u64, TypeId, PoolKey)>,
    events_written: u64,
}

impl<W: Write> RecordingWriter<W> {
    /// Write the header and the metadata record.
    pub fn new(mut out: W, codec: RecordCodec, header: Header, metadata: &Metadata) -> Result<Self> {
        let types = TypeRegistry::from_metadata(metadata, 1)?;
        codec.write_header(&mut out, &header)?;
        codec.write_record(&mut out, &Record::Metadata(metadata.clone()), 1)?;
        Ok(Self {
            out,
            codec,
            types,
            stage: Stage::Pools,
            next_record: 2,
            written: BTreeMap::new(),
            pending: Vec::new(),
            events_written: 0,
        })
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn events_written(&self) -> u64 {
        self.events_written
    }

    /// Write one constant pool section. Must precede every event.
    pub fn write_pool(&mut self, section: PoolSection) -> Result<()> {
        let index = self.next_record;
        if self.stage != Stage::Pools {
            return Err(RecordingError::malformed(
                index,
                "pool section written after the first event",
            ));
        }
        let descriptor = match self.types.get(section.type_id) {
            Some(t) if !t.is_event => t.clone(),
            _ => {
                return Err(RecordingError::malformed(
                    index,
                    format!("type {} is not a pool type", section.type_id),
                ))
            }
        };

        let mut mentioned = Vec::new();
        for entry in &section.entries {
            check_values(&descriptor, &entry.values, index, &mut mentioned)?;
        }
        self.pending
            .extend(mentioned.into_iter().map(|(t, k)| (index, t, k)));
        let keys = self.written.entry(section.type_id).or_default();
        keys.extend(section.entries.iter().map(|e| e.key));

        self.write(&Record::Pool(section))
    }

    /// Write the entries of one pool from decoded objects.
    pub fn write_objects<'a, I>(&mut self, type_id: TypeId, objects: I) -> Result<()>
    where
        I: IntoIterator<Item = (PoolKey, &'a RecordedObject)>,
    {
        let entries = objects
            .into_iter()
            .map(|(key, object)| PoolEntry {
                key,
                values: object.values().iter().map(encode_value).collect(),
            })
            .collect();
        self.write_pool(PoolSection { type_id, entries })
    }

    pub fn write_event(&mut self, event: RawEvent) -> Result<()> {
        let index = self.next_record;
        if self.stage == Stage::Pools {
            self.check_pending()?;
            self.stage = Stage::Events;
        }

        let descriptor = match self.types.get(event.type_id) {
            Some(t) if t.is_event => t.clone(),
            _ => {
                return Err(RecordingError::malformed(
                    index,
                    format!("type {} is not an event type", event.type_id),
                ))
            }
        };

        let mut mentioned = Vec::new();
        check_values(&descriptor, &event.values, index, &mut mentioned)?;
        if let Some(thread) = event.thread {
            let thread_type = self.types.thread_type().ok_or_else(|| {
                RecordingError::malformed(index, "event has a thread but no thread type is declared")
            })?;
            mentioned.push((thread_type, thread));
        }
        for (type_id, key) in mentioned {
            self.check_written(type_id, key)?;
        }

        self.write(&Record::Event(event))?;
        self.events_written += 1;
        Ok(())
    }

    /// Re-encode a decoded event.
    pub fn write_recorded_event(&mut self, event: &RecordedEvent) -> Result<()> {
        self.write_event(RawEvent {
            type_id: event.event_type.id,
            timestamp: event.timestamp,
            thread: event.thread.as_ref().map(|r| r.key()),
            values: event.values.iter().map(encode_value).collect(),
        })
    }

    /// Write the end marker, flush, and hand back the sink.
    pub fn finish(mut self) -> Result<W> {
        if self.stage == Stage::Pools {
            self.check_pending()?;
        }
        self.write(&Record::End)?;
        self.out.flush()?;
        Ok(self.out)
    }

    fn write(&mut self, record: &Record) -> Result<()> {
        let index = self.next_record;
        self.codec.write_record(&mut self.out, record, index)?;
        self.next_record += 1;
        Ok(())
    }

    fn check_pending(&mut self) -> Result<()> {
        for (_, type_id, key) in std::mem::take(&mut self.pending) {
            self.check_written(type_id, key)?;
        }
        Ok(())
    }

    fn check_written(&self, type_id: TypeId, key: PoolKey) -> Result<()> {
        if self.written.get(&type_id).is_some_and(|k| k.contains(&key)) {
            return Ok(());
        }
        Err(RecordingError::UnknownKey {
            pool: self
                .types
                .get(type_id)
                .map(|t| t.name.clone())
                .unwrap_or_else(|| type_id.to_string()),
            key,
        })
    }
}

/// Turn a decoded value back into its wire form.
pub fn encode_value(value: &Value) -> RawValue {
    match value {
        Value::Null => RawValue::Null,
        Value::Boolean(v) => RawValue::Boolean(*v),
        Value::Long(v) => RawValue::Long(*v),
        Value::Double(v) => RawValue::Double(*v),
        Value::String(v) => RawValue::String(v.clone()),
        Value::Ref(r) => RawValue::Key(r.key()),
        Value::Array(items) => RawValue::Array(items.iter().map(encode_value).collect()),
    }
}

/// Check field count and shapes; collect every `(pool type, key)` mentioned.
fn check_values(
    descriptor: &TypeDescriptor,
    values: &[RawValue],
    index: u64,
    mentioned: &mut Vec<(TypeId, PoolKey)>,
) -> Result<()> {
    if values.len() != descriptor.fields.len() {
        return Err(RecordingError::malformed(
            index,
            format!(
                "{} declares {} fields, got {}",
                descriptor.name,
                descriptor.fields.len(),
                values.len()
            ),
        ));
    }
    for (field, value) in descriptor.fields.iter().zip(values) {
        if !value.conforms_to(field) {
            return Err(RecordingError::malformed(
                index,
                format!(
                    "field {}.{} cannot hold a {} value",
                    descriptor.name,
                    field.name,
                    value.tag()
                ),
            ));
        }
        if let FieldKind::Constant(type_id) = field.kind {
            collect_keys(value, type_id, mentioned);
        }
    }
    Ok(())
}

fn collect_keys(value: &RawValue, type_id: TypeId, mentioned: &mut Vec<(TypeId, PoolKey)>) {
    match value {
        RawValue::Key(key) => mentioned.push((type_id, *key)),
        RawValue::Array(items) => items
            .iter()
            .for_each(|item| collect_keys(item, type_id, mentioned)),
        _ => {}
    }
}

//! Recording reader
//!
//! Opening a recording reads the header, the metadata record and every
//! constant pool section. Pools are loaded in two phases: all keys of all
//! pools are registered first, then each entry is decoded and bound. Since
//! decoding turns keys into [`Reference`]s, an entry may point at any
//! registered key, bound or not, including its own.
//!
//! Events are then produced lazily, in file order, by [`RecordingReader::events`].
//! A reader cannot rewind; reopen the file to iterate again.

use scrubjay_shared::protocol::wire::{Header, PoolSection, RawEvent, RawValue, Record, RecordCodec};
use scrubjay_shared::{
    ConstantPools, FieldDescriptor, FieldKind, RecordedEvent, RecordedObject, RecordingError,
    Reference, Result, TypeDescriptor, TypeId, TypeRegistry, Value,
};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Sequential reader over one recording
pub struct RecordingReader<R: Read> {
    input: R,
    codec: RecordCodec,
    header: Header,
    types: TypeRegistry,
    pools: ConstantPools,
    /// Index of the next record to read (the header is record 0)
    next_record: u64,
    /// First event, read while looking for the end of the pool sections
    pending_event: Option<(u64, RawEvent)>,
    events_read: u64,
    finished: bool,
}

impl RecordingReader<BufReader<File>> {
    /// Open a recording file.
    pub fn open(path: &Path, codec: RecordCodec) -> Result<Self> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file), codec)
    }
}

impl<R: Read> RecordingReader<R> {
    /// Read the header, metadata and constant pools from `input`.
    pub fn new(mut input: R, codec: RecordCodec) -> Result<Self> {
        let header = codec.read_header(&mut input)?;

        let types = match codec.read_record(&mut input, 1)? {
            Record::Metadata(metadata) => TypeRegistry::from_metadata(&metadata, 1)?,
            other => {
                return Err(RecordingError::malformed(
                    1,
                    format!("expected metadata record, found {}", other.kind()),
                ))
            }
        };

        let mut reader = Self {
            input,
            codec,
            header,
            types,
            pools: ConstantPools::new(),
            next_record: 2,
            pending_event: None,
            events_read: 0,
            finished: false,
        };

        let mut sections = Vec::new();
        loop {
            let index = reader.next_record;
            match reader.read_record()? {
                Record::Pool(section) => sections.push((index, section)),
                Record::Event(raw) => {
                    reader.pending_event = Some((index, raw));
                    break;
                }
                Record::End => {
                    reader.finished = true;
                    break;
                }
                Record::Metadata(_) => {
                    return Err(RecordingError::malformed(index, "duplicate metadata record"))
                }
            }
        }

        reader.pools = load_pools(&reader.types, sections)?;
        debug!(
            pools = reader.pools.iter().count(),
            entries = reader.pools.total_entries(),
            "constant pools loaded"
        );
        Ok(reader)
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn types(&self) -> &TypeRegistry {
        &self.types
    }

    pub fn pools(&self) -> &ConstantPools {
        &self.pools
    }

    pub fn codec(&self) -> RecordCodec {
        self.codec
    }

    /// Number of events produced so far
    pub fn events_read(&self) -> u64 {
        self.events_read
    }

    /// Lazily decode the remaining events.
    ///
    /// The first error ends the sequence.
    pub fn events(&mut self) -> Events<'_, R> {
        Events { reader: self }
    }

    fn read_record(&mut self) -> Result<Record> {
        let index = self.next_record;
        self.next_record += 1;
        self.codec.read_record(&mut self.input, index)
    }

    fn next_event(&mut self) -> Option<Result<RecordedEvent>> {
        if self.finished {
            return None;
        }

        let (index, raw) = match self.pending_event.take() {
            Some(pending) => pending,
            None => {
                let index = self.next_record;
                match self.read_record() {
                    Ok(Record::Event(raw)) => (index, raw),
                    Ok(Record::End) => {
                        self.finished = true;
                        return None;
                    }
                    Ok(other) => {
                        self.finished = true;
                        return Some(Err(RecordingError::malformed(
                            index,
                            format!("unexpected {} record after the first event", other.kind()),
                        )));
                    }
                    Err(e) => {
                        self.finished = true;
                        return Some(Err(e));
                    }
                }
            }
        };

        let decoder = Decoder {
            types: &self.types,
            pools: &self.pools,
        };
        match decoder.event(raw, index, self.events_read) {
            Ok(event) => {
                self.events_read += 1;
                Some(Ok(event))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// Iterator returned by [`RecordingReader::events`]
pub struct Events<'r, R: Read> {
    reader: &'r mut RecordingReader<R>,
}

impl<R: Read> Events<'_, R> {
    /// Pools of the recording being iterated
    pub fn pools(&self) -> &ConstantPools {
        &self.reader.pools
    }
}

impl<R: Read> Iterator for Events<'_, R> {
    type Item = Result<RecordedEvent>;

    fn next(&mut self) -> Option<Self::Item> {
        self.reader.next_event()
    }
}

/// Register every key of every section, then decode and bind the entries.
fn load_pools(types: &TypeRegistry, sections: Vec<(u64, PoolSection)>) -> Result<ConstantPools> {
    let mut pools = ConstantPools::new();

    for (index, section) in &sections {
        let descriptor = pool_type(types, section.type_id, *index)?;
        let pool = pools.pool_mut(descriptor);
        for entry in &section.entries {
            pool.register(entry.key);
        }
    }

    for (index, section) in sections {
        let descriptor = pool_type(types, section.type_id, index)?.clone();
        for entry in section.entries {
            let values = Decoder {
                types,
                pools: &pools,
            }
            .values(&descriptor, entry.values, index)?;
            pools
                .pool_mut(&descriptor)
                .bind(entry.key, RecordedObject::new(descriptor.clone(), values))?;
        }
    }

    Ok(pools)
}

fn pool_type(types: &TypeRegistry, type_id: TypeId, index: u64) -> Result<&Arc<TypeDescriptor>> {
    match types.get(type_id) {
        Some(descriptor) if !descriptor.is_event => Ok(descriptor),
        Some(descriptor) => Err(RecordingError::malformed(
            index,
            format!("pool section for event type {}", descriptor.name),
        )),
        None => Err(RecordingError::malformed(
            index,
            format!("pool section for undeclared type {}", type_id),
        )),
    }
}

/// Turns raw values into resolved values against the metadata and pools
struct Decoder<'a> {
    types: &'a TypeRegistry,
    pools: &'a ConstantPools,
}

impl Decoder<'_> {
    fn event(&self, raw: RawEvent, index: u64, ordinal: u64) -> Result<RecordedEvent> {
        let event_type = match self.types.get(raw.type_id) {
            Some(t) if t.is_event => t.clone(),
            Some(t) => {
                return Err(RecordingError::malformed(
                    index,
                    format!("{} is not an event type", t.name),
                ))
            }
            None => {
                return Err(RecordingError::malformed(
                    index,
                    format!("undeclared event type {}", raw.type_id),
                ))
            }
        };

        let values = self.values(&event_type, raw.values, index)?;

        let thread = match raw.thread {
            None => None,
            Some(key) => {
                let thread_type = self.types.thread_type().ok_or_else(|| {
                    RecordingError::malformed(index, "event has a thread but no thread type is declared")
                })?;
                Some(self.reference(thread_type, key)?)
            }
        };

        // thread identity varies per event, so the name is resolved here
        let thread_name = match &thread {
            Some(r) => self.pools.resolve(r)?.get_str("name").map(str::to_string),
            None => None,
        };

        Ok(RecordedEvent {
            ordinal,
            event_type,
            timestamp: raw.timestamp,
            thread,
            thread_name,
            values,
        })
    }

    fn values(
        &self,
        descriptor: &TypeDescriptor,
        raw: Vec<RawValue>,
        index: u64,
    ) -> Result<Vec<Value>> {
        if raw.len() != descriptor.fields.len() {
            return Err(RecordingError::malformed(
                index,
                format!(
                    "{} declares {} fields, record has {}",
                    descriptor.name,
                    descriptor.fields.len(),
                    raw.len()
                ),
            ));
        }

        descriptor
            .fields
            .iter()
            .zip(raw)
            .map(|(field, value)| {
                if !value.conforms_to(field) {
                    return Err(RecordingError::malformed(
                        index,
                        format!(
                            "field {}.{}: {} value does not match {}",
                            descriptor.name,
                            field.name,
                            value.tag(),
                            describe(field)
                        ),
                    ));
                }
                self.value(field.kind, value)
            })
            .collect()
    }

    fn value(&self, kind: FieldKind, raw: RawValue) -> Result<Value> {
        Ok(match raw {
            RawValue::Null => Value::Null,
            RawValue::Boolean(v) => Value::Boolean(v),
            RawValue::Long(v) => Value::Long(v),
            RawValue::Double(v) => Value::Double(v),
            RawValue::String(v) => Value::String(v),
            RawValue::Key(key) => match kind {
                FieldKind::Constant(type_id) => Value::Ref(self.reference(type_id, key)?),
                // conformance was checked by the caller
                _ => Value::Null,
            },
            RawValue::Array(items) => Value::Array(
                items
                    .into_iter()
                    .map(|item| self.value(kind, item))
                    .collect::<Result<_>>()?,
            ),
        })
    }

    /// Reference to a registered key; unregistered keys are corrupt input.
    fn reference(&self, type_id: TypeId, key: u64) -> Result<Reference> {
        match self.pools.get(type_id) {
            Some(pool) if pool.contains(key) => Ok(pool.reference(key)),
            _ => Err(RecordingError::UnknownKey {
                pool: self
                    .types
                    .get(type_id)
                    .map(|t| t.name.clone())
                    .unwrap_or_else(|| type_id.to_string()),
                key,
            }),
        }
    }
}

fn describe(field: &FieldDescriptor) -> String {
    let kind = match field.kind {
        FieldKind::Boolean => "boolean".to_string(),
        FieldKind::Long => "long".to_string(),
        FieldKind::Double => "double".to_string(),
        FieldKind::String => "string".to_string(),
        FieldKind::Constant(id) => format!("constant({})", id),
    };
    if field.array {
        format!("{}[]", kind)
    } else {
        kind
    }
}

//! Shared fixture: a small zoo recording with cyclic constant pools
#![allow(dead_code)]

use scrubjay_engine::collector::LivenessMark;
use scrubjay_engine::output::recording::RecordingWriter;
use scrubjay_engine::{FilterRuleSet, RecordingReader, RuleKind};
use scrubjay_shared::protocol::wire::{Header, PoolEntry, PoolSection, RawEvent, RawValue, RecordCodec};
use scrubjay_shared::{FieldDescriptor, FieldKind, Metadata, PoolKey, TypeDescriptor};
use std::collections::BTreeMap;
use std::io::{Cursor, Read};
use std::path::Path;

pub const THREAD: u64 = 1;
pub const FRAME: u64 = 2;
pub const STACK: u64 = 3;
pub const CLASS: u64 = 4;
pub const LOADER: u64 = 5;

pub const TIGER: u64 = 10;
pub const ZEBRA: u64 = 11;
pub const TIGERFISH: u64 = 12;

pub const START_NANOS: i64 = 1_700_000_000_000_000_000;

pub fn metadata() -> Metadata {
    Metadata {
        types: vec![
            TypeDescriptor::constant(THREAD, "thread")
                .with_field(FieldDescriptor::new("name", FieldKind::String)),
            TypeDescriptor::constant(FRAME, "frame")
                .with_field(FieldDescriptor::new("method", FieldKind::String))
                .with_field(FieldDescriptor::new("caller", FieldKind::Constant(FRAME))),
            TypeDescriptor::constant(STACK, "stacktrace")
                .with_field(FieldDescriptor::array("frames", FieldKind::Constant(FRAME))),
            TypeDescriptor::constant(CLASS, "class")
                .with_field(FieldDescriptor::new("name", FieldKind::String))
                .with_field(FieldDescriptor::new("loader", FieldKind::Constant(LOADER))),
            TypeDescriptor::constant(LOADER, "loader")
                .with_field(FieldDescriptor::new("name", FieldKind::String))
                .with_field(FieldDescriptor::new("class", FieldKind::Constant(CLASS))),
            TypeDescriptor::event(TIGER, "example.Tiger")
                .with_category("Mammal")
                .with_field(FieldDescriptor::new("stack", FieldKind::Constant(STACK)))
                .with_field(FieldDescriptor::new("class", FieldKind::Constant(CLASS))),
            TypeDescriptor::event(ZEBRA, "example.Zebra")
                .with_category("Mammal")
                .with_field(FieldDescriptor::new("stack", FieldKind::Constant(STACK))),
            TypeDescriptor::event(TIGERFISH, "example.Tigerfish")
                .with_category("Fish")
                .with_field(FieldDescriptor::new("stack", FieldKind::Constant(STACK)))
                .with_field(FieldDescriptor::new("class", FieldKind::Constant(CLASS))),
        ],
        thread_type: Some(THREAD),
    }
}

fn entry(key: PoolKey, values: Vec<RawValue>) -> PoolEntry {
    PoolEntry { key, values }
}

fn text(s: &str) -> RawValue {
    RawValue::String(s.to_string())
}

fn key(k: Option<PoolKey>) -> RawValue {
    k.map_or(RawValue::Null, RawValue::Key)
}

/// Pool sections of the zoo recording.
///
/// frame 1 calls itself, frames 3 and 4 call each other, class 1 and
/// loader 1 point at each other. Thread 4, frame 6, stack 4, class 3 and
/// loader 2 are never reached from an event.
pub fn pool_sections() -> Vec<PoolSection> {
    let frame = |k: PoolKey, method: &str, caller: Option<PoolKey>| entry(k, vec![text(method), key(caller)]);
    vec![
        PoolSection {
            type_id: THREAD,
            entries: vec![
                entry(1, vec![text("India")]),
                entry(2, vec![text("Namibia")]),
                entry(3, vec![text("Lake Tanganyika")]),
                entry(4, vec![text("Unused")]),
            ],
        },
        PoolSection {
            type_id: FRAME,
            entries: vec![
                frame(1, "run", Some(1)),
                frame(2, "hunt", Some(1)),
                frame(3, "graze", Some(4)),
                frame(4, "walk", Some(3)),
                frame(5, "swim", None),
                frame(6, "orphan", Some(6)),
            ],
        },
        PoolSection {
            type_id: STACK,
            entries: vec![
                entry(1, vec![RawValue::Array(vec![RawValue::Key(2), RawValue::Key(1)])]),
                entry(2, vec![RawValue::Array(vec![RawValue::Key(3)])]),
                entry(3, vec![RawValue::Array(vec![RawValue::Key(5)])]),
                entry(4, vec![RawValue::Array(vec![RawValue::Key(6)])]),
            ],
        },
        PoolSection {
            type_id: CLASS,
            entries: vec![
                entry(1, vec![text("Cat"), RawValue::Key(1)]),
                entry(2, vec![text("Cichlid"), RawValue::Key(1)]),
                entry(3, vec![text("Unused"), RawValue::Key(2)]),
            ],
        },
        PoolSection {
            type_id: LOADER,
            entries: vec![
                entry(1, vec![text("app"), RawValue::Key(1)]),
                entry(2, vec![text("boot"), RawValue::Key(3)]),
            ],
        },
    ]
}

/// Events in file order: Tiger/India, Zebra/Namibia, Tigerfish/Lake Tanganyika, Zebra/Namibia
pub fn events() -> Vec<RawEvent> {
    vec![
        RawEvent {
            type_id: TIGER,
            timestamp: 100,
            thread: Some(1),
            values: vec![RawValue::Key(1), RawValue::Key(1)],
        },
        RawEvent {
            type_id: ZEBRA,
            timestamp: 200,
            thread: Some(2),
            values: vec![RawValue::Key(2)],
        },
        RawEvent {
            type_id: TIGERFISH,
            timestamp: 300,
            thread: Some(3),
            values: vec![RawValue::Key(3), RawValue::Key(2)],
        },
        RawEvent {
            type_id: ZEBRA,
            timestamp: 400,
            thread: Some(2),
            values: vec![RawValue::Key(2)],
        },
    ]
}

pub fn zoo_bytes() -> Vec<u8> {
    let mut writer = RecordingWriter::new(
        Vec::new(),
        RecordCodec::default(),
        Header::new(START_NANOS),
        &metadata(),
    )
    .unwrap();
    for section in pool_sections() {
        writer.write_pool(section).unwrap();
    }
    for event in events() {
        writer.write_event(event).unwrap();
    }
    writer.finish().unwrap()
}

pub fn write_zoo(path: &Path) {
    std::fs::write(path, zoo_bytes()).unwrap();
}

pub fn rules(flags: &[(RuleKind, &str)]) -> FilterRuleSet {
    FilterRuleSet::from_rules(flags.iter().copied()).unwrap()
}

/// Decoded view of a recording: events and the keys of every pool
#[derive(Debug, PartialEq)]
pub struct Contents {
    /// (event type, timestamp, thread name)
    pub events: Vec<(String, i64, Option<String>)>,
    pub pools: BTreeMap<String, Vec<PoolKey>>,
    /// Pool keys reachable from the events
    pub reachable: BTreeMap<String, Vec<PoolKey>>,
}

impl Contents {
    pub fn names(&self) -> Vec<&str> {
        self.events.iter().map(|(name, _, _)| name.as_str()).collect()
    }

    pub fn keys(&self, pool: &str) -> Vec<PoolKey> {
        self.pools.get(pool).cloned().unwrap_or_default()
    }
}

pub fn contents<R: Read>(mut reader: RecordingReader<R>) -> Contents {
    let mut live = LivenessMark::new();
    let mut decoded = Vec::new();
    let mut events = reader.events();
    while let Some(event) = events.next() {
        let event = event.unwrap();
        live.mark_event(&event, events.pools()).unwrap();
        decoded.push((event.name().to_string(), event.timestamp, event.thread_name.clone()));
    }

    let mut pools = BTreeMap::new();
    let mut reachable = BTreeMap::new();
    for pool in reader.pools().iter() {
        assert!(pool.is_complete(), "pool {} has unbound keys", pool.name());
        pools.insert(pool.name().to_string(), pool.keys().collect());
        reachable.insert(pool.name().to_string(), live.live_keys(pool.type_id()).collect());
    }

    Contents {
        events: decoded,
        pools,
        reachable,
    }
}

pub fn read_file(path: &Path) -> Contents {
    contents(RecordingReader::open(path, RecordCodec::default()).unwrap())
}

pub fn read_bytes(bytes: &[u8]) -> Contents {
    contents(RecordingReader::new(Cursor::new(bytes), RecordCodec::default()).unwrap())
}

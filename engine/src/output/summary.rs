//! Recording summary
//!
//! Reads a recording once and reports its start time, the number of events
//! of every declared event type and the number of entries in every pool.

use scrubjay_shared::protocol::wire::RecordCodec;
use scrubjay_shared::utils::time::format_epoch_nanos;
use scrubjay_shared::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use crate::error::Result;
use crate::reader::RecordingReader;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventTypeSummary {
    pub name: String,
    pub categories: Vec<String>,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSummary {
    pub name: String,
    pub entries: usize,
}

/// Overview of one recording
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordingSummary {
    pub version: u32,
    pub start_time: String,
    pub start_time_nanos: i64,
    pub events: u64,
    pub first_timestamp: Option<Timestamp>,
    pub last_timestamp: Option<Timestamp>,

    /// Declared event types, most frequent first
    pub event_types: Vec<EventTypeSummary>,
    pub pools: Vec<PoolSummary>,
}

impl RecordingSummary {
    /// Span between the first and last event timestamps
    pub fn span(&self) -> Option<i64> {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => Some(last.saturating_sub(first)),
            _ => None,
        }
    }
}

/// Summarize the recording at `path`.
pub fn summarize(path: &Path, codec: RecordCodec) -> Result<RecordingSummary> {
    let mut reader = RecordingReader::open(path, codec)?;
    summarize_reader(&mut reader)
}

/// Summarize the events remaining in `reader`.
pub fn summarize_reader<R: Read>(reader: &mut RecordingReader<R>) -> Result<RecordingSummary> {
    let header = *reader.header();
    let mut counts: BTreeMap<_, u64> = reader.types().event_types().map(|t| (t.id, 0)).collect();
    let mut first_timestamp = None;
    let mut last_timestamp = None;
    let mut events = 0;

    for event in reader.events() {
        let event = event?;
        *counts.entry(event.event_type.id).or_default() += 1;
        first_timestamp = Some(first_timestamp.map_or(event.timestamp, |t: i64| t.min(event.timestamp)));
        last_timestamp = Some(last_timestamp.map_or(event.timestamp, |t: i64| t.max(event.timestamp)));
        events += 1;
    }

    let mut event_types: Vec<_> = reader
        .types()
        .event_types()
        .map(|t| EventTypeSummary {
            name: t.name.clone(),
            categories: t.categories.clone(),
            count: counts.get(&t.id).copied().unwrap_or(0),
        })
        .collect();
    event_types.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

    let pools = reader
        .pools()
        .iter()
        .map(|pool| PoolSummary {
            name: pool.name().to_string(),
            entries: pool.len(),
        })
        .collect();

    Ok(RecordingSummary {
        version: header.version,
        start_time: format_epoch_nanos(header.start_time_nanos),
        start_time_nanos: header.start_time_nanos,
        events,
        first_timestamp,
        last_timestamp,
        event_types,
        pools,
    })
}

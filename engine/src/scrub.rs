//! Two-pass scrubbing
//!
//! The decision pass reads every event, evaluates the filter and marks the
//! pool entries reachable from retained events. The emit pass reads the
//! recording again and writes the metadata, the live entries of every pool
//! and the retained events, in file order.
//!
//! File output goes to a temporary file next to the destination, which is
//! moved into place only after both passes succeeded.

use scrubjay_shared::protocol::wire::{Header, RecordCodec};
use scrubjay_shared::{PoolKey, RecordedObject, RecordingError};
use serde::Serialize;
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, info};

use crate::collector::{LivenessMark, Selection};
use crate::error::{Result, ScrubError};
use crate::filter::FilterRuleSet;
use crate::output::recording::RecordingWriter;
use crate::reader::RecordingReader;

/// Entries of one pool before and after scrubbing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolCounts {
    pub name: String,
    pub read: usize,
    pub written: usize,
}

/// Outcome of one scrub
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScrubSummary {
    pub events_read: u64,
    pub events_retained: u64,
    pub pools: Vec<PoolCounts>,
}

impl ScrubSummary {
    /// True when neither an event nor a pool entry was dropped
    pub fn is_unchanged(&self) -> bool {
        self.events_read == self.events_retained && self.pools.iter().all(|p| p.read == p.written)
    }

    pub fn events_removed(&self) -> u64 {
        self.events_read - self.events_retained
    }

    pub fn entries_removed(&self) -> usize {
        self.pools.iter().map(|p| p.read - p.written).sum()
    }
}

/// Filters recordings with a fixed rule set
#[derive(Debug, Clone)]
pub struct Scrubber {
    rules: FilterRuleSet,
    codec: RecordCodec,
}

impl Scrubber {
    pub fn new(rules: FilterRuleSet, codec: RecordCodec) -> Self {
        Self { rules, codec }
    }

    pub fn rules(&self) -> &FilterRuleSet {
        &self.rules
    }

    /// Decision pass: pick events and mark the pool entries they reach.
    pub fn decide<R: Read>(
        &self,
        reader: &mut RecordingReader<R>,
    ) -> Result<(Selection, LivenessMark)> {
        let mut selection = Selection::new();
        let mut live = LivenessMark::new();

        let mut events = reader.events();
        while let Some(event) = events.next() {
            let event = event?;
            let keep = self.rules.matches(&event);
            if keep {
                live.mark_event(&event, events.pools())?;
            }
            selection.record(&event, keep);
        }

        debug!(
            events_read = selection.events_read(),
            events_retained = selection.events_retained(),
            live_entries = live.len(),
            "decision pass complete"
        );
        Ok((selection, live))
    }

    /// Emit pass: write the live pool entries and the selected events.
    ///
    /// `reader` must be a fresh reader over the same recording the decision
    /// pass read.
    pub fn emit<R: Read, W: Write>(
        &self,
        reader: &mut RecordingReader<R>,
        selection: &Selection,
        live: &LivenessMark,
        out: W,
    ) -> Result<(W, ScrubSummary)> {
        let header = Header::new(reader.header().start_time_nanos);
        let metadata = reader.types().to_metadata();
        let mut writer = RecordingWriter::new(out, self.codec, header, &metadata)?;

        let mut pools = Vec::new();
        for pool in reader.pools().iter() {
            let objects = live
                .live_keys(pool.type_id())
                .map(|key| pool.get(key).map(|object| (key, object)))
                .collect::<std::result::Result<Vec<(PoolKey, &RecordedObject)>, _>>()?;

            debug!(pool = pool.name(), read = pool.len(), written = objects.len(), "pool");
            pools.push(PoolCounts {
                name: pool.name().to_string(),
                read: pool.len(),
                written: objects.len(),
            });
            if !objects.is_empty() {
                writer.write_objects(pool.type_id(), objects)?;
            }
        }

        for event in reader.events() {
            let event = event?;
            if selection.is_retained(event.ordinal) {
                writer.write_recorded_event(&event)?;
            }
        }

        if reader.events_read() != selection.events_read() {
            return Err(RecordingError::malformed(
                reader.events_read(),
                format!(
                    "recording changed between passes: {} events, expected {}",
                    reader.events_read(),
                    selection.events_read()
                ),
            )
            .into());
        }

        for (type_id, counts) in selection.counts() {
            if let Some(event_type) = reader.types().get(*type_id) {
                debug!(
                    event_type = event_type.name.as_str(),
                    read = counts.read,
                    retained = counts.retained,
                    "events"
                );
            }
        }

        let summary = ScrubSummary {
            events_read: selection.events_read(),
            events_retained: writer.events_written(),
            pools,
        };
        let out = writer.finish()?;
        Ok((out, summary))
    }

    /// Run both passes, opening the recording once per pass.
    pub fn run<R, W, F>(&self, mut open: F, out: W) -> Result<(W, ScrubSummary)>
    where
        R: Read,
        W: Write,
        F: FnMut() -> scrubjay_shared::Result<RecordingReader<R>>,
    {
        let (selection, live) = self.decide(&mut open()?)?;
        self.emit(&mut open()?, &selection, &live, out)
    }

    /// Scrub `input` into `output`.
    ///
    /// The destination is written only when both passes succeed; an existing
    /// destination is replaced only when `overwrite` is set.
    pub fn scrub_file(&self, input: &Path, output: &Path, overwrite: bool) -> Result<ScrubSummary> {
        info!(input = %input.display(), output = %output.display(), "scrubbing recording");

        let dir = match output.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let tmp = tempfile::Builder::new()
            .prefix(".scrubjay-")
            .suffix(".tmp")
            .tempfile_in(dir)?;

        let (out, summary) = self.run(
            || RecordingReader::open(input, self.codec),
            BufWriter::new(tmp),
        )?;
        let tmp = out.into_inner().map_err(|e| e.into_error())?;
        tmp.as_file().sync_all()?;

        let persisted = if overwrite {
            tmp.persist(output)
        } else {
            tmp.persist_noclobber(output)
        };
        if let Err(e) = persisted {
            return Err(match e.error.kind() {
                std::io::ErrorKind::AlreadyExists => ScrubError::OutputExists(output.to_path_buf()),
                _ => e.error.into(),
            });
        }

        info!(
            events_read = summary.events_read,
            events_retained = summary.events_retained,
            entries_removed = summary.entries_removed(),
            "scrub complete"
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unchanged_summary() {
        let mut summary = ScrubSummary {
            events_read: 3,
            events_retained: 3,
            pools: vec![PoolCounts {
                name: "thread".to_string(),
                read: 2,
                written: 2,
            }],
        };
        assert!(summary.is_unchanged());

        summary.pools[0].written = 1;
        assert!(!summary.is_unchanged());
        assert_eq!(summary.entries_removed(), 1);
        assert_eq!(summary.events_removed(), 0);
    }
}

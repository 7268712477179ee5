//! Wire format for recordings.
//!
//! Uses bincode with an explicit config so that writers and readers always
//! agree on the encoding (fixint for lengths and enum tags). Every record is
//! decoded under a size limit, so a corrupt length prefix cannot make the
//! reader allocate without bound.
//!
//! # Layout
//!
//! ```text
//! Header
//! Record::Metadata
//! Record::Pool*      constant pool sections, all before the first event
//! Record::Event*
//! Record::End
//! ```
//!
//! Pool entries and events carry [`RawValue`]s: constant pool fields are
//! plain keys here and only become references once decoded against the
//! metadata.

use bincode::Options;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};

use crate::error::{RecordingError, Result};
use crate::types::events::Timestamp;
use crate::types::metadata::{FieldDescriptor, FieldKind, Metadata, TypeId};
use crate::types::pool::PoolKey;

/// File magic
pub const MAGIC: [u8; 4] = *b"SJRC";

/// Format version
pub const FORMAT_VERSION: u32 = 1;

/// Default upper bound for a single encoded record
pub const DEFAULT_MAX_RECORD_BYTES: u64 = 64 * 1024 * 1024;

/// Single bincode config for the recording format: fixint encoding so vec
/// lengths and enum tags have a fixed size, plus a per-record size limit.
fn wire_bincode(limit: u64) -> impl bincode::config::Options {
    bincode::config::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(limit)
}

/// Recording header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub magic: [u8; 4],
    pub version: u32,

    /// Wall-clock start of the recording (nanoseconds since UNIX epoch)
    pub start_time_nanos: i64,
}

impl Header {
    pub fn new(start_time_nanos: i64) -> Self {
        Self {
            magic: MAGIC,
            version: FORMAT_VERSION,
            start_time_nanos,
        }
    }
}

/// Undecoded field value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RawValue {
    Null,
    Boolean(bool),
    Long(i64),
    Double(f64),
    String(String),
    /// Constant pool key
    Key(PoolKey),
    Array(Vec<RawValue>),
}

impl RawValue {
    /// Whether this value has the shape declared by `field`.
    ///
    /// `Null` is accepted for every field.
    pub fn conforms_to(&self, field: &FieldDescriptor) -> bool {
        match self {
            RawValue::Null => true,
            RawValue::Array(items) if field.array => {
                items.iter().all(|item| item.conforms_to_kind(field.kind))
            }
            _ if field.array => false,
            scalar => scalar.conforms_to_kind(field.kind),
        }
    }

    fn conforms_to_kind(&self, kind: FieldKind) -> bool {
        matches!(
            (self, kind),
            (RawValue::Null, _)
                | (RawValue::Boolean(_), FieldKind::Boolean)
                | (RawValue::Long(_), FieldKind::Long)
                | (RawValue::Double(_), FieldKind::Double)
                | (RawValue::String(_), FieldKind::String)
                | (RawValue::Key(_), FieldKind::Constant(_))
        )
    }

    /// Short tag used in error messages
    pub fn tag(&self) -> &'static str {
        match self {
            RawValue::Null => "null",
            RawValue::Boolean(_) => "boolean",
            RawValue::Long(_) => "long",
            RawValue::Double(_) => "double",
            RawValue::String(_) => "string",
            RawValue::Key(_) => "key",
            RawValue::Array(_) => "array",
        }
    }
}

/// One entry of a constant pool section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolEntry {
    pub key: PoolKey,
    pub values: Vec<RawValue>,
}

/// Entries of one constant pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSection {
    pub type_id: TypeId,
    pub entries: Vec<PoolEntry>,
}

/// Undecoded event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawEvent {
    pub type_id: TypeId,
    pub timestamp: Timestamp,
    /// Key into the thread pool
    pub thread: Option<PoolKey>,
    pub values: Vec<RawValue>,
}

/// A framed record following the header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Record {
    Metadata(Metadata),
    Pool(PoolSection),
    Event(RawEvent),
    End,
}

impl Record {
    pub fn kind(&self) -> &'static str {
        match self {
            Record::Metadata(_) => "metadata",
            Record::Pool(_) => "pool",
            Record::Event(_) => "event",
            Record::End => "end",
        }
    }
}

/// Encoder/decoder for headers and records
#[derive(Debug, Clone, Copy)]
pub struct RecordCodec {
    max_record_bytes: u64,
}

impl Default for RecordCodec {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RECORD_BYTES)
    }
}

impl RecordCodec {
    pub fn new(max_record_bytes: u64) -> Self {
        Self { max_record_bytes }
    }

    pub fn max_record_bytes(&self) -> u64 {
        self.max_record_bytes
    }

    /// Read and validate the header.
    pub fn read_header<R: Read>(&self, reader: &mut R) -> Result<Header> {
        let header: Header = wire_bincode(self.max_record_bytes)
            .deserialize_from(reader)
            .map_err(|e| RecordingError::from_codec(0, e))?;
        if header.magic != MAGIC {
            return Err(RecordingError::malformed(0, "not a recording (bad magic)"));
        }
        if header.version != FORMAT_VERSION {
            return Err(RecordingError::malformed(
                0,
                format!("unsupported format version {}", header.version),
            ));
        }
        Ok(header)
    }

    pub fn write_header<W: Write>(&self, writer: &mut W, header: &Header) -> Result<()> {
        wire_bincode(self.max_record_bytes)
            .serialize_into(writer, header)
            .map_err(|e| RecordingError::from_codec(0, e))
    }

    /// Read the record at position `index` (1-based after the header).
    pub fn read_record<R: Read>(&self, reader: &mut R, index: u64) -> Result<Record> {
        wire_bincode(self.max_record_bytes)
            .deserialize_from(reader)
            .map_err(|e| RecordingError::from_codec(index, e))
    }

    pub fn write_record<W: Write>(&self, writer: &mut W, record: &Record, index: u64) -> Result<()> {
        wire_bincode(self.max_record_bytes)
            .serialize_into(writer, record)
            .map_err(|e| RecordingError::from_codec(index, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::metadata::TypeDescriptor;
    use std::io::Cursor;

    #[test]
    fn test_header_and_records_stream() {
        let codec = RecordCodec::default();
        let mut bytes = Vec::new();
        codec.write_header(&mut bytes, &Header::new(1_700_000_000)).unwrap();
        let records = vec![
            Record::Metadata(Metadata {
                types: vec![TypeDescriptor::event(10, "example.Tiger")],
                thread_type: None,
            }),
            Record::Event(RawEvent {
                type_id: 10,
                timestamp: 5,
                thread: None,
                values: vec![],
            }),
            Record::End,
        ];
        for (i, record) in records.iter().enumerate() {
            codec.write_record(&mut bytes, record, i as u64 + 1).unwrap();
        }

        let mut cursor = Cursor::new(bytes);
        let header = codec.read_header(&mut cursor).unwrap();
        assert_eq!(header.start_time_nanos, 1_700_000_000);
        for (i, expected) in records.iter().enumerate() {
            let record = codec.read_record(&mut cursor, i as u64 + 1).unwrap();
            assert_eq!(&record, expected);
        }
    }

    #[test]
    fn test_bad_magic_rejected() {
        let codec = RecordCodec::default();
        let mut bytes = Vec::new();
        let mut header = Header::new(0);
        header.magic = *b"NOPE";
        codec.write_header(&mut bytes, &header).unwrap();
        let err = codec.read_header(&mut Cursor::new(bytes)).unwrap_err();
        assert!(matches!(err, RecordingError::MalformedRecord { index: 0, .. }));
    }

    #[test]
    fn test_truncated_record_is_malformed() {
        let codec = RecordCodec::default();
        let mut bytes = Vec::new();
        codec
            .write_record(
                &mut bytes,
                &Record::Event(RawEvent {
                    type_id: 1,
                    timestamp: 0,
                    thread: Some(3),
                    values: vec![RawValue::String("Lake Tanganyika".to_string())],
                }),
                4,
            )
            .unwrap();
        bytes.truncate(bytes.len() - 3);
        let err = codec.read_record(&mut Cursor::new(bytes), 4).unwrap_err();
        assert!(matches!(err, RecordingError::MalformedRecord { index: 4, .. }));
    }

    #[test]
    fn test_record_size_limit() {
        let codec = RecordCodec::new(16);
        let record = Record::Event(RawEvent {
            type_id: 1,
            timestamp: 0,
            thread: None,
            values: vec![RawValue::String("x".repeat(64))],
        });
        assert!(codec.write_record(&mut Vec::new(), &record, 1).is_err());
    }

    #[test]
    fn test_conformance() {
        let long = FieldDescriptor::new("count", FieldKind::Long);
        let frames = FieldDescriptor::array("frames", FieldKind::Constant(3));

        assert!(RawValue::Long(3).conforms_to(&long));
        assert!(RawValue::Null.conforms_to(&long));
        assert!(!RawValue::String("3".into()).conforms_to(&long));
        assert!(!RawValue::Array(vec![]).conforms_to(&long));

        assert!(RawValue::Array(vec![RawValue::Key(1), RawValue::Key(2)]).conforms_to(&frames));
        assert!(!RawValue::Key(1).conforms_to(&frames));
        assert!(!RawValue::Array(vec![RawValue::Long(1)]).conforms_to(&frames));
    }
}

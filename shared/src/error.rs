//! Error types for reading, resolving and writing recordings

use thiserror::Error;

use crate::types::pool::PoolKey;

/// Recording error type
#[derive(Debug, Error)]
pub enum RecordingError {
    /// A field references a key that was never registered in its pool
    #[error("unknown constant pool key: {pool}[{key}]")]
    UnknownKey { pool: String, key: PoolKey },

    /// A pool key was bound twice with conflicting values
    #[error("conflicting bindings for constant pool key: {pool}[{key}]")]
    DuplicateBinding { pool: String, key: PoolKey },

    /// A reference was resolved before its pool finished binding
    #[error("reference resolved before its pool was bound: {0}")]
    UnresolvedReference(String),

    /// A record violates its declared schema or the stream is truncated
    #[error("malformed record #{index}: {reason}")]
    MalformedRecord { index: u64, reason: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl RecordingError {
    pub fn malformed(index: u64, reason: impl Into<String>) -> Self {
        RecordingError::MalformedRecord {
            index,
            reason: reason.into(),
        }
    }

    /// Map a bincode failure on record `index`.
    ///
    /// An unexpected EOF means the stream was cut short and is reported as a
    /// malformed record; any other IO failure stays an IO failure.
    pub fn from_codec(index: u64, err: bincode::Error) -> Self {
        match *err {
            bincode::ErrorKind::Io(io) if io.kind() != std::io::ErrorKind::UnexpectedEof => {
                RecordingError::Io(io)
            }
            other => RecordingError::malformed(index, other.to_string()),
        }
    }
}

/// Result type for recording operations
pub type Result<T> = std::result::Result<T, RecordingError>;

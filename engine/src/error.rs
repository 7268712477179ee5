//! Error types for scrub operations

use scrubjay_shared::RecordingError;
use std::path::PathBuf;
use thiserror::Error;

/// Scrub error type
#[derive(Debug, Error)]
pub enum ScrubError {
    /// Reading, resolving or writing the recording failed
    #[error(transparent)]
    Recording(#[from] RecordingError),

    /// A filter pattern could not be parsed
    #[error("invalid filter {flag}: {reason}")]
    InvalidFilter { flag: String, reason: String },

    /// The destination exists and overwriting was not requested
    #[error("output file already exists: {}", .0.display())]
    OutputExists(PathBuf),

    /// Input and output name the same file
    #[error("input and output are the same file: {}", .0.display())]
    SameFile(PathBuf),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl From<std::io::Error> for ScrubError {
    fn from(err: std::io::Error) -> Self {
        ScrubError::Recording(RecordingError::Io(err))
    }
}

/// Result type for scrub operations
pub type Result<T> = std::result::Result<T, ScrubError>;

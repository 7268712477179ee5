//! Shared types and utilities for scrubjay
//!
//! This crate contains the recording data model (type metadata, constant
//! pools, references, events), the on-disk wire format and the error
//! taxonomy used by the scrub engine and the command-line tool.

pub mod error;
pub mod protocol;
pub mod types;
pub mod utils;

pub use error::{RecordingError, Result};

// Re-export commonly used types
pub use types::{events::*, metadata::*, pool::*, reference::*, value::*};

//! On-disk recording format
//!
//! A recording is a header followed by a stream of length-delimited records:
//! one metadata record, the constant pool sections, the events and an end
//! marker.

pub mod wire;

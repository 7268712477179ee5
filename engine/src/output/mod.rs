//! Output generation: scrubbed recordings, JSON event dumps and summaries

pub mod json;
pub mod recording;
pub mod summary;

//! Time-related utilities

use chrono::{SecondsFormat, TimeZone, Utc};

/// Render nanoseconds since UNIX epoch as an RFC 3339 UTC timestamp
pub fn format_epoch_nanos(nanos: i64) -> String {
    Utc.timestamp_nanos(nanos)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

//! Millisecond timestamp helpers.
//!
//! All persisted timestamps in reqforge are milliseconds since the UNIX
//! epoch, matching the ordering convention of commit history.

use chrono::{DateTime, Utc};

/// Current time as milliseconds since the UNIX epoch.
pub fn now_ms() -> i64 {
    Utc::now().timestamp_millis()
}

/// Convert a millisecond timestamp into a UTC datetime.
///
/// Falls back to the epoch for out-of-range values.
pub fn from_ms(timestamp_ms: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(timestamp_ms)
        .unwrap_or_else(|| DateTime::from_timestamp_millis(0).unwrap_or_else(Utc::now))
}

/// Format a millisecond timestamp as an RFC 3339 string for display.
pub fn format_ms(timestamp_ms: i64) -> String {
    from_ms(timestamp_ms).to_rfc3339()
}

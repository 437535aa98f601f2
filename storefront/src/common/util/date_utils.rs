use chrono::{SecondsFormat, Utc};
use std::time::{SystemTime, UNIX_EPOCH};

/// Current instant as an ISO-8601 UTC string with millisecond precision,
/// e.g. `2024-05-01T09:30:00.123Z`.
#[inline]
pub fn now_iso() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// Fast path: returns 0 on any error instead of double error handling
#[inline]
pub fn current_time_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

use chrono::{DateTime, Utc};

/// Current time as Unix milliseconds, the unit every stored timestamp uses.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Renders stored milliseconds as RFC 3339 for API payloads.
pub fn to_rfc3339(millis: i64) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

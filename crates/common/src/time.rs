use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

/// Format a system time as an RFC 3339 UTC timestamp with millisecond precision.
pub fn rfc3339(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn now_rfc3339() -> String {
    rfc3339(SystemTime::now())
}

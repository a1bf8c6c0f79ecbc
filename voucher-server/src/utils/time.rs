//! Time helpers
//!
//! All persisted timestamps are epoch milliseconds (UTC).

use chrono::Utc;

/// Trailing quota window length
pub const DAY_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Current time in epoch milliseconds
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// UTC date stamp used in order ids, e.g. "20260829"
pub fn date_stamp() -> String {
    Utc::now().format("%Y%m%d").to_string()
}

//! Timestamp utilities

use chrono::{DateTime, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Current UTC timestamp, never earlier than `floor`
///
/// Wall clocks can step backwards; lifecycle timestamps that must be
/// monotone relative to an earlier one are taken through this.
pub fn now_not_before(floor: DateTime<Utc>) -> DateTime<Utc> {
    now().max(floor)
}

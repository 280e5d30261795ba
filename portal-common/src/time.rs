//! Clock access for event and record timestamps

use chrono::{DateTime, Utc};

/// Current UTC time
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

//! Utility functions and helpers.

pub mod http;

use chrono::{NaiveDate, Utc};

/// Current time in Unix milliseconds, used as a cache buster.
pub fn unix_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Today's calendar date in UTC.
pub fn today_utc() -> NaiveDate {
    Utc::now().date_naive()
}

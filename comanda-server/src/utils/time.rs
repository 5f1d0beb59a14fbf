//! Date parsing for query parameters.
//!
//! Date-to-timestamp conversion happens at the API handler layer; the
//! store only ever sees `i64` Unix millis.

use chrono::{NaiveDate, NaiveTime};

use shared::error::{AppError, AppResult};

/// Parse a date string (YYYY-MM-DD).
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// Start of the date (00:00:00 UTC) as Unix millis.
pub fn day_start_millis(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp_millis()
}

/// Last millisecond of the date (UTC), for inclusive upper bounds.
pub fn day_end_millis(date: NaiveDate) -> i64 {
    let next_day = date.succ_opt().unwrap_or(date);
    day_start_millis(next_day) - 1
}

//! Calendar date parsing.
//!
//! The platform mixes plain ISO dates (`2024-06-28`) with ISO-8601 date-times
//! (`2024-06-28T00:00:00Z`, `2024-06-28T00:00:00`). Only the calendar date is
//! relevant for maturity checks, so every form collapses to a `NaiveDate`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Parses a calendar date from a plain ISO date or an ISO-8601 date-time.
///
/// Returns `None` when the value is not a recognisable date.
///
/// # Examples
///
/// ```
/// use cva_core::parse_calendar_date;
/// use chrono::NaiveDate;
///
/// let expected = NaiveDate::from_ymd_opt(2024, 6, 28).unwrap();
/// assert_eq!(parse_calendar_date("2024-06-28"), Some(expected));
/// assert_eq!(parse_calendar_date("2024-06-28T00:00:00Z"), Some(expected));
/// assert_eq!(parse_calendar_date("2024-06-28T13:45:00"), Some(expected));
/// assert_eq!(parse_calendar_date("28/06/2024"), None);
/// ```
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();

    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = value.parse::<NaiveDateTime>() {
        return Some(dt.date());
    }

    None
}

//! Date and timestamp handling.
//!
//! Travel dates travel through URLs as `YYYY-MM-DD`. Timestamps come from the
//! data API either as RFC 3339 (`timestamptz` columns) or as naive ISO 8601
//! (`timestamp` columns), which are taken to be UTC.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use super::DomainError;

/// Format used for travel dates in URLs and booking rows.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse a travel date in `YYYY-MM-DD` form.
pub fn parse_travel_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT)
        .map_err(|_| DomainError::InvalidTimestamp(s.to_string()))
}

/// Parse an optional travel date: blank input means "no date".
pub fn parse_optional_travel_date(s: Option<&str>) -> Result<Option<NaiveDate>, DomainError> {
    match s.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => parse_travel_date(s).map(Some),
        None => Ok(None),
    }
}

/// Format a travel date as `YYYY-MM-DD`.
pub fn format_travel_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parse a timestamp from the data API.
pub fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, DomainError> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    // Postgres renders timestamptz with a space separator and a short offset
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%#z") {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Ok(naive.and_utc());
        }
    }
    Err(DomainError::InvalidTimestamp(s.to_string()))
}

/// First and last millisecond of a calendar day, in UTC.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = date.and_time(NaiveTime::MIN).and_utc();
    // 23:59:59.999 always exists
    let end_time = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    (start, date.and_time(end_time).and_utc())
}

//! Conversions between request date strings and engine timestamps.
//!
//! Requests carry either a calendar date (`2024-06-01`, read as UTC midnight)
//! or a full RFC 3339 timestamp. Responses always render RFC 3339 in UTC with
//! millisecond precision.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::Serializer;

use crate::limits::{MAX_VALID_TIMESTAMP_MS, MIN_VALID_TIMESTAMP_MS};
use crate::model::Ms;

pub fn now_ms() -> Ms {
    Utc::now().timestamp_millis()
}

/// Parse a request date. Returns `None` for anything unparsable or outside
/// the supported timestamp range.
pub fn parse_date(raw: &str) -> Option<Ms> {
    let raw = raw.trim();
    let ms = if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        dt.timestamp_millis()
    } else {
        let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
        date.and_hms_opt(0, 0, 0)?.and_utc().timestamp_millis()
    };
    (MIN_VALID_TIMESTAMP_MS..=MAX_VALID_TIMESTAMP_MS)
        .contains(&ms)
        .then_some(ms)
}

pub fn format_ms(ms: Ms) -> String {
    match DateTime::<Utc>::from_timestamp_millis(ms) {
        Some(dt) => dt.to_rfc3339_opts(SecondsFormat::Millis, true),
        None => ms.to_string(),
    }
}

/// `serialize_with` adapter for `Ms` fields.
pub fn serialize_ms<S: Serializer>(ms: &Ms, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&format_ms(*ms))
}

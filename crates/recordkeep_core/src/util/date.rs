//! Human-readable timestamp rendering.

use chrono::{DateTime, Local, TimeZone, Utc};
use std::fmt::Display;

/// `dd.mm.yyyy, HH:MM:SS`
const DATE_FORMAT: &str = "%d.%m.%Y, %H:%M:%S";

/// Renders epoch milliseconds in the local time zone.
///
/// Returns `None` when the timestamp is outside the representable range.
pub fn format_date(timestamp_ms: i64) -> Option<String> {
    format_date_in(timestamp_ms, &Local)
}

/// Renders epoch milliseconds in `tz`.
pub fn format_date_in<Tz>(timestamp_ms: i64, tz: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    let instant = DateTime::<Utc>::from_timestamp_millis(timestamp_ms)?;
    Some(instant.with_timezone(tz).format(DATE_FORMAT).to_string())
}

//! Date and date-time conversion for the serialization framework.
//!
//! Input accepts RFC 3339 / ISO-8601 with or without a UTC offset, using
//! either `+10:00` or Jira's `+1000` offset spelling. A value that carries
//! an offset keeps it unless a target timezone is supplied, in which case
//! the instant is converted into that timezone. A value with no offset is
//! read as wall-clock time in the supplied timezone, or the local timezone.

use crate::error::DeserializeError;
use chrono::{
    DateTime, FixedOffset, Local, NaiveDate, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%dT%H:%M:%S%.f%z"];
const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a date-time string, attaching `tz` (or the local timezone).
pub fn parse_datetime(
    raw: &str,
    tz: Option<FixedOffset>,
) -> Result<DateTime<FixedOffset>, DeserializeError> {
    let raw = raw.trim();

    let with_offset = DateTime::parse_from_rfc3339(raw).ok().or_else(|| {
        OFFSET_FORMATS
            .iter()
            .find_map(|fmt| DateTime::parse_from_str(raw, fmt).ok())
    });
    if let Some(dt) = with_offset {
        return Ok(tz.map_or(dt, |tz| dt.with_timezone(&tz)));
    }

    let naive = NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| DeserializeError::invalid("DateTime", raw))?;

    attach_timezone(&naive, tz).ok_or_else(|| DeserializeError::invalid("DateTime", raw))
}

/// Parse a date string; a full date-time is accepted and truncated to its date.
pub fn parse_date(raw: &str, tz: Option<FixedOffset>) -> Result<NaiveDate, DeserializeError> {
    let raw = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Ok(date);
    }
    parse_datetime(raw, tz)
        .map(|dt| dt.date_naive())
        .map_err(|_| DeserializeError::invalid("Date", raw))
}

/// Format a date-time as RFC 3339, keeping sub-second precision only when present.
#[must_use]
pub fn format_datetime(dt: &DateTime<FixedOffset>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

#[must_use]
pub fn format_date(date: &NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Parse a timezone spelling into a fixed offset.
///
/// Accepts `UTC`, `Z`, `local`, and offsets such as `+10:00`, `-0600` or `+10`.
#[must_use]
pub fn parse_offset(raw: &str) -> Option<FixedOffset> {
    let raw = raw.trim();
    match raw.to_ascii_lowercase().as_str() {
        "utc" | "z" | "gmt" | "etc/gmt" => return Some(Utc.fix()),
        "local" => return Some(*Local::now().offset()),
        _ => {}
    }

    let (sign, rest) = match raw.as_bytes().first()? {
        b'+' => (1, &raw[1..]),
        b'-' => (-1, &raw[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match digits.len() {
        1 | 2 => (digits.parse::<i32>().ok()?, 0),
        4 => (digits[..2].parse::<i32>().ok()?, digits[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

fn attach_timezone(naive: &NaiveDateTime, tz: Option<FixedOffset>) -> Option<DateTime<FixedOffset>> {
    match tz {
        Some(tz) => tz.from_local_datetime(naive).single(),
        None => Local
            .from_local_datetime(naive)
            .earliest()
            .map(|dt| dt.fixed_offset()),
    }
}

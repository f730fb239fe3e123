//! Plain text helpers shared by the table and detail views.

use chrono::{DateTime, FixedOffset, Utc};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal width from `COLUMNS`, then the terminal itself, falling back to 80.
#[must_use]
pub fn terminal_width() -> usize {
    if let Ok(columns) = std::env::var("COLUMNS") {
        if let Ok(value) = columns.trim().parse::<usize>() {
            if value > 0 {
                return value;
            }
        }
    }
    crossterm::terminal::size().map_or(80, |(cols, _)| usize::from(cols).max(20))
}

/// Visible width of `text` in terminal columns.
#[must_use]
pub fn visible_len(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Truncate `text` to `max_len` visible columns, ending in `...` when cut.
///
/// Handles wide characters (emojis, CJK) correctly using `unicode-width`.
#[must_use]
pub fn truncate(text: &str, max_len: usize) -> String {
    if visible_len(text) <= max_len {
        return text.to_string();
    }
    if max_len <= 3 {
        return take_columns(text, max_len);
    }
    let mut s = take_columns(text, max_len - 3);
    s.push_str("...");
    s
}

fn take_columns(text: &str, columns: usize) -> String {
    let mut w = 0;
    let mut s = String::new();
    for c in text.chars() {
        let cw = UnicodeWidthChar::width(c).unwrap_or(0);
        if w + cw > columns {
            break;
        }
        w += cw;
        s.push(c);
    }
    s
}

/// Pad `text` with spaces to `width` visible columns.
#[must_use]
pub fn pad(text: &str, width: usize) -> String {
    let len = visible_len(text);
    if len >= width {
        return text.to_string();
    }
    format!("{text}{}", " ".repeat(width - len))
}

/// Coarse "N units ago" rendering of a timestamp.
#[must_use]
pub fn relative_time(dt: &DateTime<FixedOffset>, now: DateTime<Utc>) -> String {
    let seconds = now.signed_duration_since(dt.with_timezone(&Utc)).num_seconds();
    if seconds < 0 {
        return "in the future".to_string();
    }
    let (value, unit) = match seconds {
        s if s < 60 => return "just now".to_string(),
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 86_400 * 30 => (s / 86_400, "day"),
        s if s < 86_400 * 365 => (s / (86_400 * 30), "month"),
        s => (s / (86_400 * 365), "year"),
    };
    if value == 1 {
        let article = if unit == "hour" { "an" } else { "a" };
        format!("{article} {unit} ago")
    } else {
        format!("{value} {unit}s ago")
    }
}

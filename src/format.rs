//! Human-readable timestamps for the notification dropdown.

use std::fmt::Write;

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};

/// Short date format used once a notification is a week old
/// (the en-US locale short date, e.g. `3/14/2026`).
pub const DEFAULT_DATE_FORMAT: &str = "%-m/%-d/%Y";

const MS_PER_MINUTE: i64 = 60_000;

/// Format `created_at` relative to `now`.
///
/// Elapsed time is floored to whole minutes, hours and days:
/// under a minute is `"Just now"`, then `"{n}m ago"`, `"{n}h ago"`,
/// `"{n}d ago"` up to a week, after which the absolute date is shown.
/// Timestamps in the future read as `"Just now"`.
///
/// # Examples
///
/// ```
/// use chrono::{Duration, TimeZone, Utc};
/// use idea_portal::format::relative_time;
///
/// let now = Utc.with_ymd_and_hms(2026, 3, 14, 9, 0, 0).unwrap();
/// assert_eq!(relative_time(now, now - Duration::minutes(5)), "5m ago");
/// assert_eq!(relative_time(now, now - Duration::days(10)), "3/4/2026");
/// ```
pub fn relative_time(now: DateTime<Utc>, created_at: DateTime<Utc>) -> String {
    relative_time_with(now, created_at, DEFAULT_DATE_FORMAT)
}

/// Like [`relative_time`], with a `chrono` strftime pattern for the
/// absolute date.
///
/// An invalid pattern falls back to [`DEFAULT_DATE_FORMAT`]; use
/// [`is_valid_date_format`] to reject it up front.
pub fn relative_time_with(
    now: DateTime<Utc>,
    created_at: DateTime<Utc>,
    date_format: &str,
) -> String {
    let elapsed_ms = (now - created_at).num_milliseconds();
    let minutes = elapsed_ms.div_euclid(MS_PER_MINUTE);
    let hours = minutes.div_euclid(60);
    let days = hours.div_euclid(24);

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{minutes}m ago")
    } else if hours < 24 {
        format!("{hours}h ago")
    } else if days < 7 {
        format!("{days}d ago")
    } else {
        absolute_date(created_at, date_format)
    }
}

/// `true` if `date_format` parses as a strftime pattern.
pub fn is_valid_date_format(date_format: &str) -> bool {
    !StrftimeItems::new(date_format).any(|item| matches!(item, Item::Error))
}

fn absolute_date(created_at: DateTime<Utc>, date_format: &str) -> String {
    let mut out = String::new();
    if write!(out, "{}", created_at.format(date_format)).is_ok() {
        return out;
    }
    tracing::warn!(date_format, "invalid date format, using default");
    created_at.format(DEFAULT_DATE_FORMAT).to_string()
}

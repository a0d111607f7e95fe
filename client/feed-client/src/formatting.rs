//! Display formatting for timestamps and engagement counters.

use crate::config::DisplayConfig;
use chrono::{DateTime, Utc};
use std::fmt::Write;

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;

const FALLBACK_DATE_FORMAT: &str = "%-m/%-d/%Y";

/// Relative age of `timestamp` as seen at `now`.
///
/// Truncating division on each threshold: under a minute is "just now",
/// then "{n}m", "{n}h", "{n}d", and anything a week or older is printed as
/// an absolute date in the viewer's zone. Timestamps in the future count
/// as "just now".
pub fn relative_time_at(
    timestamp: DateTime<Utc>,
    now: DateTime<Utc>,
    display: &DisplayConfig,
) -> String {
    let elapsed = (now - timestamp).num_seconds();

    if elapsed < MINUTE {
        "just now".to_string()
    } else if elapsed < HOUR {
        format!("{}m", elapsed / MINUTE)
    } else if elapsed < DAY {
        format!("{}h", elapsed / HOUR)
    } else if elapsed < WEEK {
        format!("{}d", elapsed / DAY)
    } else {
        absolute_date(timestamp, display)
    }
}

/// [`relative_time_at`] against the current clock.
pub fn relative_time(timestamp: DateTime<Utc>, display: &DisplayConfig) -> String {
    relative_time_at(timestamp, Utc::now(), display)
}

fn absolute_date(timestamp: DateTime<Utc>, display: &DisplayConfig) -> String {
    let local = timestamp.with_timezone(&display.offset());
    let pattern = display.date_format.as_str();

    let mut out = String::new();
    if write!(out, "{}", local.format(pattern)).is_ok() {
        return out;
    }

    tracing::warn!(
        date_format = pattern,
        "Invalid date format, using default"
    );
    local.format(FALLBACK_DATE_FORMAT).to_string()
}

/// Whether `pattern` is a usable strftime pattern.
pub fn is_valid_date_format(pattern: &str) -> bool {
    let mut out = String::new();
    write!(out, "{}", Utc::now().format(pattern)).is_ok()
}

/// Compact counter label: `750`, `1.5K`, `2.5M`.
///
/// One decimal, rounded half up on the exact value. The unit is chosen
/// from the raw count, so 999_950 renders as "1000.0K".
pub fn compact_count(n: u64) -> String {
    if n >= 1_000_000 {
        with_one_decimal(n.saturating_add(50_000) / 100_000, 'M')
    } else if n >= 1_000 {
        with_one_decimal((n + 50) / 100, 'K')
    } else {
        n.to_string()
    }
}

fn with_one_decimal(tenths: u64, unit: char) -> String {
    format!("{}.{}{}", tenths / 10, tenths % 10, unit)
}

//! Timestamp parsing and wall-clock formatting helpers.
//!
//! Everything here is total: unparseable input yields `None` or a placeholder,
//! never a panic.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone};

/// Shown in place of a missing or unparseable punch time.
pub const PLACEHOLDER_TIME: &str = "--:--";

/// Naive timestamp layouts accepted from the backend, tried in order.
const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

const MS_PER_HOUR: f64 = 3_600_000.0;

/// Parse a backend timestamp into local time.
///
/// Accepts RFC 3339, naive `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` (interpreted as
/// local wall-clock time) and bare `YYYY-MM-DD` (local midnight).
pub fn parse_timestamp(input: &str) -> Option<DateTime<Local>> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Local));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, fmt) {
            return local_from_naive(naive);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|date| local_from_naive(date.and_time(NaiveTime::MIN)))
}

/// Calendar date of a backend date or timestamp string.
///
/// Offset-carrying timestamps keep the date in their own offset; everything
/// else uses the date as written.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.date_naive());
    }

    let date = NaiveDate::parse_from_str(input.get(..10)?, "%Y-%m-%d").ok()?;
    if input.len() == 10 || parse_timestamp(input).is_some() {
        Some(date)
    } else {
        None
    }
}

/// Resolve a naive local time, picking the earlier instant on DST overlaps.
pub fn local_from_naive(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    Local.from_local_datetime(&naive).earliest()
}

/// `HH:MM` for a punch time, or the placeholder when absent.
pub fn wall_clock(time: Option<DateTime<Local>>) -> String {
    match time {
        Some(t) => t.format("%H:%M").to_string(),
        None => PLACEHOLDER_TIME.to_string(),
    }
}

/// `HH:MM:SS` for the live clock.
pub fn wall_clock_seconds(time: DateTime<Local>) -> String {
    time.format("%H:%M:%S").to_string()
}

/// ISO date key (`YYYY-MM-DD`).
pub fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Start of `date` and start of the following day, in local time.
pub fn day_bounds(date: NaiveDate) -> Option<(DateTime<Local>, DateTime<Local>)> {
    let start = local_from_naive(date.and_time(NaiveTime::MIN))?;
    let end = local_from_naive(date.succ_opt()?.and_time(NaiveTime::MIN))?;
    Some((start, end))
}

/// Format a duration as `"{h}h {m}m"`. Negative durations clamp to `"0h 0m"`.
pub fn format_duration_hm(duration: TimeDelta) -> String {
    let minutes = duration.num_minutes().max(0);
    format!("{h}h {m}m", h = minutes / 60, m = minutes % 60)
}

/// Hours between two instants, rounded to one decimal. Never negative.
pub fn hours_between(start: DateTime<Local>, end: DateTime<Local>) -> f64 {
    let ms = (end - start).num_milliseconds();
    if ms <= 0 {
        return 0.0;
    }
    round_one_decimal(ms as f64 / MS_PER_HOUR)
}

/// Round to one decimal place, mapping NaN and infinities to zero.
pub fn round_one_decimal(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 10.0).round() / 10.0
}

/// Human-readable month heading, e.g. `"March 2024"`.
pub fn month_label(year: i32, month: u32) -> String {
    match NaiveDate::from_ymd_opt(year, month, 1) {
        Some(date) => date.format("%B %Y").to_string(),
        None => format!("{year}-{month:02}"),
    }
}

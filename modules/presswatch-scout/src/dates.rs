//! Normalization of the date shapes the pipeline encounters: short
//! relative expressions from result snippets ("3 hours ago") and
//! machine-readable absolute strings from article markup.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use regex::Regex;

/// Normalize a relative snippet expression against a reference instant.
///
/// Recognizes a leading integer magnitude and a minute/hour/day unit.
/// Anything else (month names, other locales, future-dated text) is
/// `None`, never an error.
pub fn normalize_relative(expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let re = Regex::new(r"(?i)^\s*(\d+)\s+(minute|hour|day)s?\b").expect("valid regex");
    let caps = re.captures(expr)?;

    let magnitude: i64 = caps[1].parse().ok()?;
    let delta = match caps[2].to_lowercase().as_str() {
        "minute" => Duration::minutes(magnitude),
        "hour" => Duration::hours(magnitude),
        "day" => Duration::days(magnitude),
        _ => return None,
    };

    Some(now - delta)
}

/// Parse an absolute machine-readable date string: RFC 3339, then
/// RFC 2822, then a bare calendar date.
pub fn parse_machine_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(DateTime::from_naive_utc_and_offset(
            date.and_hms_opt(0, 0, 0)?,
            Utc,
        ));
    }

    None
}

/// Best-effort timestamp for a snippet string: relative form first, then
/// machine-readable, then nothing.
pub fn snippet_timestamp(expr: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    normalize_relative(expr, now).or_else(|| parse_machine_date(expr))
}

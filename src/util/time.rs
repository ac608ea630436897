//! Time parsing and formatting for the CLI.

use crate::error::{Result, SyncError};
use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Parse a `--updated-after` value into a UTC timestamp.
///
/// Supports:
/// - RFC3339: `2025-01-15T12:00:00Z`, `2025-01-15T12:00:00+02:00`
/// - Naive date-time, taken as UTC: `2025-01-15T12:00:00`
/// - Simple date, UTC midnight: `2025-01-15`
/// - Relative look-back: `-30m`, `-12h`, `-7d`, `-2w`
///
/// # Errors
///
/// Returns `SyncError::InvalidTimestamp` if no format matches.
pub fn parse_since(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(naive.and_utc());
    }

    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }

    parse_lookback(s).ok_or_else(|| SyncError::InvalidTimestamp {
        value: s.to_string(),
    })
}

fn parse_lookback(s: &str) -> Option<DateTime<Utc>> {
    let rest = s.strip_prefix('-')?;
    let unit = rest.chars().last()?;
    let amount: i64 = rest[..rest.len() - unit.len_utf8()].parse().ok()?;
    let duration = match unit {
        'm' => Duration::try_minutes(amount)?,
        'h' => Duration::try_hours(amount)?,
        'd' => Duration::try_days(amount)?,
        'w' => Duration::try_weeks(amount)?,
        _ => return None,
    };
    Some(Utc::now() - duration)
}

/// RFC3339 at second precision, or `never`.
#[must_use]
pub fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    ts.map_or_else(
        || "never".to_string(),
        |ts| ts.to_rfc3339_opts(SecondsFormat::Secs, true),
    )
}

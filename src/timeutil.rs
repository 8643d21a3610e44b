//! Timestamp parsing, normalization, and macro resolution.
//!
//! Metadata documents and requests may carry macro tokens (`now`, `lastday`,
//! `lasthour`, `lastday-P1D`) in place of concrete timestamps; they resolve
//! at read time. Two quirks of the deployed protocol are kept on purpose:
//!
//! * `lasthour` is aliased to `lastday` (the most recent midnight, not the
//!   most recent hour boundary). Deployed metadata relies on it; flag it to
//!   stakeholders rather than correcting it silently.
//! * `lastday`/`lasthour` boundaries are computed in local time, not UTC.

use chrono::{Duration, Local, NaiveDate, NaiveDateTime, NaiveTime, Utc};

use crate::error::{KelvinError, Result};

/// Canonical minute-precision request layout.
pub const MINUTE_FORMAT: &str = "%Y-%m-%dT%H:%MZ";
/// Layout macro tokens resolve to.
pub const SECOND_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Outcome of comparing two canonical timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrder {
    Before,
    Equal,
    After,
}

const CALENDAR_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%MZ",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
];

// Ordinal day-of-year notation, YYYY-DOYTHH:MMZ
const ORDINAL_FORMATS: &[&str] = &[
    "%Y-%jT%H:%M:%S%.fZ",
    "%Y-%jT%H:%M:%SZ",
    "%Y-%jT%H:%MZ",
    "%Y-%jT%H:%M:%S",
    "%Y-%jT%H:%M",
];

/// Resolve a macro token to a concrete timestamp string.
///
/// `now` resolves to the current UTC time; `lastday` and `lasthour` both
/// resolve to the most recent local midnight (see module docs for why);
/// `lastday-P1D` to the midnight before that. Any other value passes through
/// unchanged.
pub fn resolve_macro(token: &str) -> String {
    resolve_macro_at(token, Utc::now().naive_utc(), local_midnight())
}

/// Macro resolution against explicit clock values, for deterministic tests.
pub(crate) fn resolve_macro_at(
    token: &str,
    now_utc: NaiveDateTime,
    midnight: NaiveDateTime,
) -> String {
    match token {
        "now" => now_utc.format(SECOND_FORMAT).to_string(),
        "lastday" | "lasthour" => midnight.format(SECOND_FORMAT).to_string(),
        "lastday-P1D" => (midnight - Duration::days(1)).format(SECOND_FORMAT).to_string(),
        other => other.to_string(),
    }
}

fn local_midnight() -> NaiveDateTime {
    Local::now().date_naive().and_time(NaiveTime::MIN)
}

/// Resolve the first quoted macro token in one line of a serialized JSON
/// document, e.g. `"stopDate": "now",` becomes a concrete quoted timestamp.
pub fn resolve_macro_line(line: &str) -> String {
    // lastday-P1D must be tried before its lastday substring
    for token in ["now", "lastday-P1D", "lastday", "lasthour"] {
        let quoted = format!("\"{token}\"");
        if let Some(i) = line.find(&quoted) {
            let resolved = resolve_macro(token);
            return format!("{}\"{}\"{}", &line[..i], resolved, &line[i + quoted.len()..]);
        }
    }
    line.to_string()
}

/// Unquoted variant of [`resolve_macro_line`] for plain text such as sample
/// request URLs on the introduction page.
pub fn resolve_macro_text(text: &str) -> String {
    for token in ["now", "lastday-P1D", "lastday", "lasthour"] {
        if let Some(i) = text.find(token) {
            let resolved = resolve_macro(token);
            return format!("{}{}{}", &text[..i], resolved, &text[i + token.len()..]);
        }
    }
    text.to_string()
}

/// Parse a timestamp permissively: calendar notation with optional seconds
/// and fractions, ordinal-day notation, or a bare date.
pub fn parse_flexible(value: &str) -> Result<NaiveDateTime> {
    for format in CALENDAR_FORMATS.iter().chain(ORDINAL_FORMATS) {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(parsed);
        }
    }
    for format in ["%Y-%m-%d", "%Y-%j"] {
        if let Ok(parsed) = NaiveDate::parse_from_str(value, format) {
            return Ok(parsed.and_time(NaiveTime::MIN));
        }
    }
    Err(KelvinError::TimeParse {
        value: value.to_string(),
    })
}

/// Reformat a timestamp to the canonical minute-precision layout.
///
/// Seconds and fractional seconds are silently truncated; ordinal-day input
/// comes out in calendar notation. Idempotent over its own output.
pub fn normalize_to_minute(value: &str) -> Result<String> {
    Ok(parse_flexible(value)?.format(MINUTE_FORMAT).to_string())
}

/// Parse a timestamp already in the canonical minute layout.
pub fn parse_canonical(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, MINUTE_FORMAT).map_err(|_| KelvinError::TimeParse {
        value: value.to_string(),
    })
}

/// Compare two canonical minute-precision timestamps.
pub fn compare_times(t1: &str, t2: &str) -> Result<TimeOrder> {
    let a = parse_canonical(t1)?;
    let b = parse_canonical(t2)?;
    Ok(match a.cmp(&b) {
        std::cmp::Ordering::Less => TimeOrder::Before,
        std::cmp::Ordering::Equal => TimeOrder::Equal,
        std::cmp::Ordering::Greater => TimeOrder::After,
    })
}

//! Conditional-GET freshness evaluation.
//!
//! A dataset+window pair has a single last-modified instant, recomputed per
//! request (underlying data may change between requests, so nothing here is
//! cached). Instants are whole seconds since the epoch: the conditional-GET
//! header format cannot carry sub-second precision, so it is discarded
//! consistently on both the write and compare paths.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, Datelike, Utc};

use crate::backend::Backend;
use crate::timeutil;

/// The last-modified instant for a dataset window, in epoch seconds.
///
/// Backends with a real freshness signal report it; without one the current
/// time is used, so such datasets are always "fresh" and a conditional GET
/// never short-circuits. The fallback is never an old sentinel, which would
/// make clients wrongly treat stale data as current.
pub fn last_modified(backend: &dyn Backend, id: &str, time_min: &str, time_max: &str) -> u64 {
    backend
        .last_modified(id, time_min, time_max)
        .unwrap_or_else(now_epoch)
}

/// True iff the client's copy is current and backend dispatch can be
/// skipped entirely.
pub fn is_not_modified(last_modified: u64, client_timestamp: u64) -> bool {
    last_modified <= client_timestamp
}

/// Current time in whole epoch seconds.
pub fn now_epoch() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Scan a flat-CSV archive (`data/<id>/<YYYY>/<name>.YYYYMMDD.csv`) for the
/// newest modification time among files whose embedded date key falls in
/// `[time_min, time_max]`. `None` when the bounds are unparsable or no file
/// matches.
pub fn archive_last_modified(
    home: &Path,
    id: &str,
    time_min: &str,
    time_max: &str,
) -> Option<u64> {
    let min = timeutil::parse_flexible(time_min).ok()?;
    let max = timeutil::parse_flexible(time_max).ok()?;
    let key_min = min.format("%Y%m%d").to_string();
    let key_max = max.format("%Y%m%d").to_string();

    let mut newest: Option<SystemTime> = None;
    for year in min.year()..=max.year() {
        let dir = home.join("data").join(id).join(format!("{year:04}"));
        let Ok(entries) = std::fs::read_dir(&dir) else { continue };
        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            let Some(key) = day_key(&name) else { continue };
            if key_min.as_str() <= key && key <= key_max.as_str() {
                if let Ok(modified) = entry.metadata().and_then(|m| m.modified()) {
                    newest = Some(match newest {
                        Some(current) if current >= modified => current,
                        _ => modified,
                    });
                }
            }
        }
    }
    newest
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs())
}

/// The 8-digit date key embedded just before a `.csv` extension.
fn day_key(name: &str) -> Option<&str> {
    let stem = name.strip_suffix(".csv")?;
    let key = stem.rsplit('.').next()?;
    (key.len() == 8 && key.bytes().all(|b| b.is_ascii_digit())).then_some(key)
}

/// Parse an RFC-2822 `If-Modified-Since` header value into epoch seconds.
pub fn parse_http_date(value: &str) -> Option<u64> {
    DateTime::parse_from_rfc2822(value)
        .ok()
        .map(|dt| dt.timestamp().max(0) as u64)
}

/// Format epoch seconds as an RFC-2822 GMT `Last-Modified` header value.
pub fn format_http_date(epoch: u64) -> String {
    DateTime::<Utc>::from_timestamp(epoch as i64, 0)
        .unwrap_or_default()
        .format("%a, %d %b %Y %H:%M:%S GMT")
        .to_string()
}

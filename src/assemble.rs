//! Final response assembly for buffered backend output.
//!
//! Backends that read whole storage units routinely over-return at the edges
//! of the requested window; the assembler clips those rows off and settles
//! the final protocol status. It only ever removes rows, never fabricates
//! them.

use crate::status;
use crate::timeutil::{self, TimeOrder};

/// Clip backend rows to the validated window.
///
/// Rows are compared on the first column's timestamp, normalized to minute
/// precision. When the first and last rows already sit inside the window the
/// data passes through untouched; otherwise out-of-window rows are dropped.
/// Rows whose timestamp cannot be read are kept.
pub fn clip_to_window(time_min: &str, time_max: &str, data: &str) -> String {
    if data.is_empty() || !needs_clipping(time_min, time_max, data) {
        return data.to_string();
    }

    let mut kept = Vec::new();
    for line in data.lines() {
        match row_time(line) {
            Some(stamp) => {
                let before = matches!(
                    timeutil::compare_times(&stamp, time_min),
                    Ok(TimeOrder::Before)
                );
                let after = matches!(
                    timeutil::compare_times(&stamp, time_max),
                    Ok(TimeOrder::After)
                );
                if !before && !after {
                    kept.push(line);
                }
            }
            None => kept.push(line),
        }
    }

    let mut clipped = kept.join("\n");
    if !clipped.is_empty() {
        clipped.push('\n');
    }
    clipped
}

/// Decide the final protocol status for a successful backend call.
///
/// An empty buffered body means "no data for range" (1201). In streaming
/// mode an empty remainder is expected - the rows already went out - and is
/// not reclassified.
pub fn finalize(code: u16, body: &str, streaming: bool) -> u16 {
    if code >= 1400 || code == status::OK_NO_DATA {
        return code;
    }
    if body.is_empty() && !streaming {
        return status::OK_NO_DATA;
    }
    status::OK
}

fn needs_clipping(time_min: &str, time_max: &str, data: &str) -> bool {
    let first = data.lines().next().and_then(row_time);
    let last = data.lines().last().and_then(row_time);
    match (first, last) {
        (Some(first), Some(last)) => {
            matches!(timeutil::compare_times(&first, time_min), Ok(TimeOrder::Before))
                || matches!(timeutil::compare_times(&last, time_max), Ok(TimeOrder::After))
        }
        _ => false,
    }
}

fn row_time(line: &str) -> Option<String> {
    let field = line.split(',').next()?;
    timeutil::normalize_to_minute(field.trim()).ok()
}

//! Flat-CSV archive backend.
//!
//! Serves archives laid out as `data/<id>/<YYYY>/<id>.YYYYMMDD.csv`, one
//! file per day, rows starting with an ISO timestamp column. The reader
//! walks the day files covering the requested window in order; in streaming
//! mode each file goes out as its own chunk. Row-level clipping to the exact
//! window is the response assembler's job, not the reader's.

use std::path::{Path, PathBuf};

use chrono::{Datelike, Duration, NaiveDate};

use super::{Backend, BackendRequest, ChunkSink};
use crate::cache;
use crate::error::{KelvinError, Result};
use crate::status;

/// File-backed reader rooted at a HAPI home directory.
pub struct CsvBackend {
    home: PathBuf,
}

impl CsvBackend {
    pub fn new(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    fn day_file(&self, id: &str, day: NaiveDate) -> PathBuf {
        self.home
            .join("data")
            .join(id)
            .join(format!("{:04}", day.year()))
            .join(format!("{}.{}.csv", id, day.format("%Y%m%d")))
    }
}

impl Backend for CsvBackend {
    fn fetch(&self, request: &BackendRequest, sink: Option<&ChunkSink>) -> Result<(u16, String)> {
        let min = crate::timeutil::parse_flexible(&request.time_min)?;
        let max = crate::timeutil::parse_flexible(&request.time_max)?;

        let mut body = String::new();
        let mut streamed = false;
        let mut day = min.date();
        let last = max.date();
        while day <= last {
            let path = self.day_file(&request.dataset, day);
            if let Some(text) = read_day_file(&path)? {
                match sink {
                    Some(sink) if request.stream => {
                        sink.write(&text)?;
                        streamed = true;
                    }
                    _ => body.push_str(&text),
                }
            }
            day = day + Duration::days(1);
        }

        if body.is_empty() && !streamed {
            return Ok((status::OK_NO_DATA, body));
        }
        Ok((status::OK, body))
    }

    fn last_modified(&self, id: &str, time_min: &str, time_max: &str) -> Option<u64> {
        cache::archive_last_modified(&self.home, id, time_min, time_max)
    }
}

/// One day's file, or `None` when the archive has a hole there. A file that
/// exists but cannot be read is a fault, not a hole.
fn read_day_file(path: &Path) -> Result<Option<String>> {
    if !path.is_file() {
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|e| KelvinError::Backend {
        message: format!("unreadable archive file {}: {e}", path.display()),
    })?;
    Ok((!text.is_empty()).then_some(text))
}

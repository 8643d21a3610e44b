//! Request validation against dataset metadata.
//!
//! Checks run in a fixed, documented order and stop at the first failure;
//! when several problems coexist, the earliest one in that order is the one
//! reported. Every failure is a value carrying a stable protocol status
//! code, never a fault.

use std::collections::HashSet;
use std::path::Path;

use thiserror::Error;

use crate::metadata::{self, DatasetInfo};
use crate::status;
use crate::timeutil;

/// A request that passed every validation step.
#[derive(Debug, Clone)]
pub struct ValidatedRequest {
    /// Canonical minute-precision lower bound.
    pub time_min: String,
    /// Canonical minute-precision upper bound.
    pub time_max: String,
    /// Final ordered parameter list: the caller's subset or the dataset's
    /// full declared list, with any active tags appended as synthetic
    /// trailing names.
    pub parameters: Vec<String>,
    pub info: DatasetInfo,
}

/// Validation failures in documented precedence order.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ValidationFailure {
    #[error("error in start time")]
    BadStartTime,
    #[error("error in stop time")]
    BadStopTime,
    #[error("unknown dataset id")]
    UnknownDataset,
    #[error("start time equal to or after stop time")]
    EmptyRange,
    #[error("time outside valid range")]
    OutOfRange,
    #[error("too much time or data requested")]
    TooMuchData,
    #[error("unknown dataset parameter")]
    UnknownParameter,
    /// Duplicates and misordered requests share one code; the merged signal
    /// is part of the wire contract.
    #[error("out of order or duplicate parameters")]
    BadParameterOrder,
}

impl ValidationFailure {
    /// The stable protocol status code for this failure.
    pub fn code(self) -> u16 {
        match self {
            Self::BadStartTime => status::BAD_START_TIME,
            Self::BadStopTime => status::BAD_STOP_TIME,
            Self::UnknownDataset => status::UNKNOWN_DATASET,
            Self::EmptyRange => status::EMPTY_TIME_RANGE,
            Self::OutOfRange => status::TIME_OUTSIDE_RANGE,
            Self::TooMuchData => status::TOO_MUCH_DATA,
            Self::UnknownParameter => status::UNKNOWN_PARAMETER,
            Self::BadParameterOrder => status::BAD_PARAMETER_ORDER,
        }
    }
}

/// Validate a data request against a dataset's metadata.
///
/// On success the bounds come back reformatted to the canonical minute
/// layout and the parameter list is finalized (defaulted, order-checked,
/// tags appended).
pub fn validate(
    home: &Path,
    id: &str,
    time_min_raw: &str,
    time_max_raw: &str,
    parameters: Option<&[String]>,
    tags: &[String],
) -> Result<ValidatedRequest, ValidationFailure> {
    // a bare macro token as the whole stop bound resolves before parsing
    let time_max_raw = if time_max_raw == "lasthour" {
        timeutil::resolve_macro(time_max_raw)
    } else {
        time_max_raw.to_string()
    };

    let time_min = timeutil::normalize_to_minute(time_min_raw)
        .map_err(|_| ValidationFailure::BadStartTime)?;
    let time_max = timeutil::normalize_to_minute(&time_max_raw)
        .map_err(|_| ValidationFailure::BadStopTime)?;

    let (found, info) = metadata::fetch(home, id);
    if !found {
        return Err(ValidationFailure::UnknownDataset);
    }

    let min = timeutil::parse_canonical(&time_min).map_err(|_| ValidationFailure::BadStartTime)?;
    let max = timeutil::parse_canonical(&time_max).map_err(|_| ValidationFailure::BadStopTime)?;

    if min >= max {
        return Err(ValidationFailure::EmptyRange);
    }

    // a document whose own bounds cannot be parsed is unusable
    let start = timeutil::parse_flexible(&info.start_date)
        .map_err(|_| ValidationFailure::UnknownDataset)?;
    let stop = timeutil::parse_flexible(&info.stop_date)
        .map_err(|_| ValidationFailure::UnknownDataset)?;

    if min < start || max > stop {
        return Err(ValidationFailure::OutOfRange);
    }

    if info.limit_duration != 0 && (max - min).num_seconds() > info.limit_duration {
        return Err(ValidationFailure::TooMuchData);
    }

    if let Some(requested) = parameters {
        check_parameters(requested, &info)?;
    }

    let mut final_parameters = match parameters {
        Some(requested) => requested.to_vec(),
        None => info.parameter_names(),
    };
    final_parameters.extend(tags.iter().cloned());

    Ok(ValidatedRequest {
        time_min,
        time_max,
        parameters: final_parameters,
        info,
    })
}

/// Second pass once dataset parameters are known: existence, then order.
fn check_parameters(requested: &[String], info: &DatasetInfo) -> Result<(), ValidationFailure> {
    let mut seen = HashSet::new();
    for name in requested {
        if !seen.insert(name.as_str()) {
            return Err(ValidationFailure::BadParameterOrder);
        }
    }

    let mut declared = info.parameter_names();
    // the Time parameter is implicitly always allowed
    if !declared.iter().any(|n| n == "Time") {
        declared.push("Time".to_string());
    }

    for name in requested {
        if !declared.iter().any(|d| d == name) {
            return Err(ValidationFailure::UnknownParameter);
        }
    }

    // the request must be a subsequence of the declared order; misordered
    // lists are rejected, never silently reordered
    let mut next = 0;
    for name in &declared {
        if next < requested.len() && requested[next] == *name {
            next += 1;
        }
    }
    if next != requested.len() {
        return Err(ValidationFailure::BadParameterOrder);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_home() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("info")).unwrap();
        std::fs::write(
            dir.path().join("info").join("cputemp.json"),
            r#"{
                "startDate": "2020-01-01T00:00Z",
                "stopDate": "2021-01-01T00:00Z",
                "parameters": [
                    {"name": "Time", "type": "isotime"},
                    {"name": "temperature", "type": "double"},
                    {"name": "load", "type": "double"}
                ]
            }"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("info").join("capped.json"),
            r#"{
                "startDate": "2020-01-01T00:00Z",
                "stopDate": "2021-01-01T00:00Z",
                "limitDuration": 86400,
                "parameters": [{"name": "Time", "type": "isotime"}]
            }"#,
        )
        .unwrap();
        dir
    }

    fn params(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn test_valid_window_defaults_parameters() {
        let home = write_home();
        let validated = validate(
            home.path(),
            "cputemp",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            None,
            &[],
        )
        .unwrap();
        assert_eq!(validated.time_min, "2020-06-01T00:00Z");
        assert_eq!(validated.time_max, "2020-06-02T00:00Z");
        assert_eq!(validated.parameters, params(&["Time", "temperature", "load"]));
    }

    #[test]
    fn test_bounds_normalized_to_minute() {
        let home = write_home();
        let validated = validate(
            home.path(),
            "cputemp",
            "2020-06-01T00:00:30.5Z",
            "2020-154T12:00Z",
            None,
            &[],
        )
        .unwrap();
        assert_eq!(validated.time_min, "2020-06-01T00:00Z");
        assert_eq!(validated.time_max, "2020-06-02T12:00Z");
    }

    #[test]
    fn test_unparsable_bounds() {
        let home = write_home();
        let failure = validate(home.path(), "cputemp", "junk", "2020-06-02T00:00Z", None, &[]);
        assert_eq!(failure.unwrap_err().code(), 1402);
        let failure = validate(home.path(), "cputemp", "2020-06-01T00:00Z", "junk", None, &[]);
        assert_eq!(failure.unwrap_err().code(), 1403);
    }

    #[test]
    fn test_empty_range() {
        let home = write_home();
        let failure = validate(
            home.path(),
            "cputemp",
            "2020-06-02T00:00Z",
            "2020-06-02T00:00Z",
            None,
            &[],
        );
        assert_eq!(failure.unwrap_err().code(), 1404);
    }

    #[test]
    fn test_window_outside_bounds() {
        let home = write_home();
        let failure = validate(
            home.path(),
            "cputemp",
            "2019-01-01T00:00Z",
            "2019-02-01T00:00Z",
            None,
            &[],
        );
        assert_eq!(failure.unwrap_err().code(), 1405);
    }

    #[test]
    fn test_unknown_dataset_regardless_of_times() {
        let home = write_home();
        let failure = validate(
            home.path(),
            "doesnotexist",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            None,
            &[],
        );
        assert_eq!(failure.unwrap_err().code(), 1406);
    }

    #[test]
    fn test_duration_limit() {
        let home = write_home();
        let failure = validate(
            home.path(),
            "capped",
            "2020-06-01T00:00Z",
            "2020-06-03T00:00Z",
            None,
            &[],
        );
        assert_eq!(failure.unwrap_err().code(), 1408);

        // exactly at the limit passes
        assert!(validate(
            home.path(),
            "capped",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            None,
            &[],
        )
        .is_ok());
    }

    #[test]
    fn test_unknown_parameter() {
        let home = write_home();
        let requested = params(&["Time", "voltage"]);
        let failure = validate(
            home.path(),
            "cputemp",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            Some(&requested),
            &[],
        );
        assert_eq!(failure.unwrap_err().code(), 1407);
    }

    #[test]
    fn test_duplicate_parameters() {
        let home = write_home();
        let requested = params(&["temperature", "temperature"]);
        let failure = validate(
            home.path(),
            "cputemp",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            Some(&requested),
            &[],
        );
        assert_eq!(failure.unwrap_err().code(), 1411);
    }

    #[test]
    fn test_out_of_order_parameters() {
        let home = write_home();
        let requested = params(&["load", "temperature"]);
        let failure = validate(
            home.path(),
            "cputemp",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            Some(&requested),
            &[],
        );
        assert_eq!(failure.unwrap_err().code(), 1411);
    }

    #[test]
    fn test_subset_in_declared_order_kept() {
        let home = write_home();
        let requested = params(&["Time", "load"]);
        let validated = validate(
            home.path(),
            "cputemp",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            Some(&requested),
            &[],
        )
        .unwrap();
        assert_eq!(validated.parameters, requested);
    }

    #[test]
    fn test_tags_appended_as_trailing_parameters() {
        let home = write_home();
        let tags = params(&["baseline=yearly"]);
        let validated = validate(
            home.path(),
            "cputemp",
            "2020-06-01T00:00Z",
            "2020-06-02T00:00Z",
            None,
            &tags,
        )
        .unwrap();
        assert_eq!(
            validated.parameters,
            params(&["Time", "temperature", "load", "baseline=yearly"])
        );
    }
}

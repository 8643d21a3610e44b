//! Dataset metadata documents.
//!
//! Every dataset is described by a static `info/<id>.json` document under the
//! HAPI home directory; `catalog.json` enumerates the known ids and
//! `capabilities.json` declares the protocol version. All documents are
//! read-only at request time and re-read per request.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::status;
use crate::timeutil;

// Sentinel bounds for a missing document: start after stop, so every window
// falls outside range and downstream validation reports the dataset unknown
// instead of faulting.
const SENTINEL_START: &str = "3001-01-01T00:00Z";
const SENTINEL_STOP: &str = "0001-01-01T00:00Z";

/// One declared dataset parameter.
///
/// `parameters[0]` is always the mandatory `Time` field; the declared order
/// is significant and preserved everywhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Parameter {
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<Vec<u64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fill: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub units: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A custom request option a dataset accepts, with an optional constraint
/// (`{"enum": [..]}` or `{"number": ..}`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomOption {
    pub name: String,
    #[serde(default)]
    pub constraint: Option<Value>,
}

/// Parsed metadata for one dataset, plus the raw document for rendering.
#[derive(Debug, Clone)]
pub struct DatasetInfo {
    pub start_date: String,
    /// Macro tokens are resolved at fetch time; this is always concrete.
    pub stop_date: String,
    /// Maximum request window in seconds; 0 means unlimited.
    pub limit_duration: i64,
    pub parameters: Vec<Parameter>,
    pub custom_options: Vec<CustomOption>,
    pub document: Value,
}

#[derive(Deserialize)]
struct InfoDocument {
    #[serde(rename = "startDate")]
    start_date: String,
    #[serde(rename = "stopDate")]
    stop_date: String,
    #[serde(rename = "limitDuration", alias = "limitduration", default)]
    limit_duration: i64,
    #[serde(default)]
    parameters: Vec<Parameter>,
    #[serde(rename = "x_customRequestOptions", default)]
    custom_options: Vec<CustomOption>,
}

impl DatasetInfo {
    fn sentinel() -> Self {
        Self {
            start_date: SENTINEL_START.to_string(),
            stop_date: SENTINEL_STOP.to_string(),
            limit_duration: 0,
            parameters: Vec::new(),
            custom_options: Vec::new(),
            document: Value::Null,
        }
    }

    /// Names of the declared parameters in declared order.
    pub fn parameter_names(&self) -> Vec<String> {
        self.parameters.iter().map(|p| p.name.clone()).collect()
    }
}

fn info_path(home: &Path, id: &str) -> PathBuf {
    home.join("info").join(format!("{id}.json"))
}

/// Load a dataset's metadata document.
///
/// Lookup failure is a valid outcome, not a fault: the sentinel record is
/// returned with `found == false` and its bounds guarantee a downstream
/// "unknown dataset" result. A `stopDate` macro token is resolved before
/// returning, so open-ended datasets report a concrete upper bound.
pub fn fetch(home: &Path, id: &str) -> (bool, DatasetInfo) {
    // ids never address outside the info directory
    if id.contains('/') || id.contains('\\') || id.contains("..") {
        return (false, DatasetInfo::sentinel());
    }
    match load(home, id) {
        Ok(info) => (true, info),
        Err(_) => (false, DatasetInfo::sentinel()),
    }
}

fn load(home: &Path, id: &str) -> Result<DatasetInfo> {
    let raw = std::fs::read_to_string(info_path(home, id))?;
    let document: Value = serde_json::from_str(&raw)?;
    let parsed: InfoDocument = serde_json::from_value(document.clone())?;
    Ok(DatasetInfo {
        start_date: parsed.start_date,
        stop_date: timeutil::resolve_macro(&parsed.stop_date),
        limit_duration: parsed.limit_duration,
        parameters: parsed.parameters,
        custom_options: parsed.custom_options,
        document,
    })
}

/// Dataset ids enumerated by `catalog.json`.
pub fn catalog_ids(home: &Path) -> Result<Vec<String>> {
    let raw = std::fs::read_to_string(home.join("catalog.json"))?;
    let document: Value = serde_json::from_str(&raw)?;
    let mut ids = Vec::new();
    if let Some(entries) = document.get("catalog").and_then(Value::as_array) {
        for entry in entries {
            if let Some(id) = entry.get("id").and_then(Value::as_str) {
                ids.push(id.to_string());
            }
        }
    }
    Ok(ids)
}

/// The protocol version declared by `capabilities.json`.
pub fn hapi_version(home: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(home.join("capabilities.json"))?;
    let document: Value = serde_json::from_str(&raw)?;
    Ok(document
        .get("HAPI")
        .and_then(Value::as_str)
        .unwrap_or("3.1")
        .to_string())
}

/// Render a dataset's info document for transmission.
///
/// The parameter array is filtered to the requested subset when one is given
/// (index 0, the Time parameter, is always kept), every line is
/// macro-resolved, and an optional prefix is prepended to each line (`#` when
/// the document rides ahead of CSV data). Failure yields a 1500-shaped body
/// rather than an error, so callers always have something transmittable.
pub fn filtered_info(
    home: &Path,
    id: &str,
    parameters: Option<&[String]>,
    prefix: Option<&str>,
    version: &str,
) -> String {
    match render_info(home, id, parameters, prefix) {
        Ok(rendered) => rendered,
        Err(_) => status::status_body(version, status::INTERNAL_ERROR),
    }
}

fn render_info(
    home: &Path,
    id: &str,
    parameters: Option<&[String]>,
    prefix: Option<&str>,
) -> Result<String> {
    let raw = std::fs::read_to_string(info_path(home, id))?;
    let mut document: Value = serde_json::from_str(&raw)?;

    if let Some(requested) = parameters {
        if let Some(declared) = document.get_mut("parameters").and_then(Value::as_array_mut) {
            let mut kept = Vec::new();
            for (i, parameter) in declared.drain(..).enumerate() {
                let name = parameter.get("name").and_then(Value::as_str).unwrap_or("");
                if i == 0 || requested.iter().any(|r| r == name) {
                    kept.push(parameter);
                }
            }
            *declared = kept;
        }
    }

    let serialized = serde_json::to_string_pretty(&document)?;
    let mut rendered = String::new();
    for line in serialized.lines() {
        if let Some(prefix) = prefix {
            rendered.push_str(prefix);
        }
        rendered.push_str(&timeutil::resolve_macro_line(line));
        rendered.push('\n');
    }
    Ok(rendered)
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
            dir.path().join("capabilities.json"),
            r#"{"HAPI": "3.1", "outputFormats": ["csv"]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("catalog.json"),
            r#"{"HAPI": "3.1", "catalog": [{"id": "cputemp"}, {"id": "magfield"}]}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("info").join("cputemp.json"),
            r#"{
                "HAPI": "3.1",
                "startDate": "2020-01-01T00:00Z",
                "stopDate": "2021-01-01T00:00Z",
                "parameters": [
                    {"name": "Time", "type": "isotime", "length": 24},
                    {"name": "temperature", "type": "double", "units": "C"},
                    {"name": "load", "type": "double"}
                ]
            }"#,
        )
        .unwrap();
        dir
    }

    #[test]
    fn test_fetch_known_dataset() {
        let home = write_home();
        let (found, info) = fetch(home.path(), "cputemp");
        assert!(found);
        assert_eq!(info.start_date, "2020-01-01T00:00Z");
        assert_eq!(info.stop_date, "2021-01-01T00:00Z");
        assert_eq!(info.limit_duration, 0);
        assert_eq!(
            info.parameter_names(),
            vec!["Time".to_string(), "temperature".to_string(), "load".to_string()]
        );
    }

    #[test]
    fn test_fetch_missing_dataset_returns_sentinel() {
        let home = write_home();
        let (found, info) = fetch(home.path(), "doesnotexist");
        assert!(!found);
        assert_eq!(info.start_date, SENTINEL_START);
        assert_eq!(info.stop_date, SENTINEL_STOP);
        assert!(info.parameters.is_empty());
    }

    #[test]
    fn test_fetch_rejects_path_traversal() {
        let home = write_home();
        let (found, _) = fetch(home.path(), "../info/cputemp");
        assert!(!found);
    }

    #[test]
    fn test_stop_date_macro_resolved() {
        let home = write_home();
        std::fs::write(
            home.path().join("info").join("live.json"),
            r#"{"startDate": "2020-01-01T00:00Z", "stopDate": "lastday",
                "parameters": [{"name": "Time", "type": "isotime"}]}"#,
        )
        .unwrap();
        let (found, info) = fetch(home.path(), "live");
        assert!(found);
        assert!(!info.stop_date.contains("lastday"));
        assert!(timeutil::parse_flexible(&info.stop_date).is_ok());
    }

    #[test]
    fn test_catalog_ids() {
        let home = write_home();
        assert_eq!(catalog_ids(home.path()).unwrap(), vec!["cputemp", "magfield"]);
    }

    #[test]
    fn test_hapi_version() {
        let home = write_home();
        assert_eq!(hapi_version(home.path()).unwrap(), "3.1");
    }

    #[test]
    fn test_filtered_info_keeps_time_and_subset() {
        let home = write_home();
        let requested = vec!["load".to_string()];
        let rendered = filtered_info(home.path(), "cputemp", Some(&requested), None, "3.1");
        let json: Value = serde_json::from_str(&rendered).unwrap();
        let names: Vec<&str> = json["parameters"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Time", "load"]);
    }

    #[test]
    fn test_filtered_info_prefix() {
        let home = write_home();
        let rendered = filtered_info(home.path(), "cputemp", None, Some("#"), "3.1");
        assert!(rendered.lines().all(|l| l.starts_with('#')));
    }

    #[test]
    fn test_filtered_info_missing_yields_status_body() {
        let home = write_home();
        let rendered = filtered_info(home.path(), "nosuch", None, None, "3.1");
        let json: Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(json["status"]["code"], 1500);
    }
}

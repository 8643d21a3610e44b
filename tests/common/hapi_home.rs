//! Test fixture: a complete HAPI home directory in a tempdir.
//!
//! Layout matches a real deployment: capabilities.json and catalog.json at
//! the root, per-dataset documents under info/, and a flat-CSV archive under
//! data/<id>/<YYYY>/.

use std::path::Path;
use tempfile::TempDir;

/// The fixture dataset id
pub const DATASET: &str = "cputemp";

/// Create a HAPI home with one dataset covering calendar year 2020 and two
/// days of archived data (2020-06-01 and 2020-06-02).
pub fn create_test_home() -> TempDir {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    write_home(dir.path());
    dir
}

fn write_home(home: &Path) {
    std::fs::write(
        home.join("capabilities.json"),
        r#"{"HAPI": "3.1", "outputFormats": ["csv"]}"#,
    )
    .expect("Failed to write capabilities.json");

    std::fs::write(
        home.join("catalog.json"),
        r#"{"HAPI": "3.1", "catalog": [{"id": "cputemp", "title": "CPU temperature"}]}"#,
    )
    .expect("Failed to write catalog.json");

    std::fs::create_dir(home.join("info")).expect("Failed to create info dir");
    std::fs::write(
        home.join("info").join("cputemp.json"),
        r#"{
    "HAPI": "3.1",
    "status": {"code": 1200, "message": "OK"},
    "startDate": "2020-01-01T00:00Z",
    "stopDate": "2021-01-01T00:00Z",
    "parameters": [
        {"name": "Time", "type": "isotime", "length": 24, "units": "UTC"},
        {"name": "temperature", "type": "double", "units": "C", "fill": "-1e31"},
        {"name": "load", "type": "double"}
    ]
}"#,
    )
    .expect("Failed to write info document");

    let year_dir = home.join("data").join(DATASET).join("2020");
    std::fs::create_dir_all(&year_dir).expect("Failed to create archive dir");
    std::fs::write(
        year_dir.join("cputemp.20200601.csv"),
        "2020-06-01T00:10:00Z,20.5,0.93\n2020-06-01T12:00:00Z,21.0,0.41\n",
    )
    .expect("Failed to write day file");
    std::fs::write(
        year_dir.join("cputemp.20200602.csv"),
        "2020-06-02T00:00:00Z,19.5,0.12\n",
    )
    .expect("Failed to write day file");
}

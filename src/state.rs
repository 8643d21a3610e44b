//! Application state management for kelvin.
//!
//! The shared state passed to all handlers. Everything here is immutable for
//! the lifetime of the process; request isolation does the rest of the
//! concurrency work.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::backend::csv::CsvBackend;
use crate::backend::Backend;
use crate::config::Config;
use crate::error::{KelvinError, Result};
use crate::metadata;

/// The main application state shared across all handlers
pub struct AppState {
    /// Configuration
    pub config: Config,
    /// HAPI home directory holding the protocol documents
    pub home: PathBuf,
    /// Protocol version declared by capabilities.json
    pub version: String,
    /// The deployment's data reader
    pub backend: Arc<dyn Backend>,
}

impl AppState {
    /// Build the state for a deployment: read the protocol version once and
    /// select the configured backend.
    pub fn new(config: Config, home: PathBuf) -> Result<Self> {
        let version = metadata::hapi_version(&home)?;
        let backend = select_backend(&config, &home)?;
        Ok(Self {
            config,
            home,
            version,
            backend,
        })
    }

    /// Whether this deployment speaks protocol version 3 or later (affects
    /// which request keys the introduction page advertises).
    pub fn is_version_3(&self) -> bool {
        self.version
            .split('.')
            .next()
            .and_then(|major| major.parse::<u32>().ok())
            .map(|major| major >= 3)
            .unwrap_or(true)
    }
}

fn select_backend(config: &Config, home: &Path) -> Result<Arc<dyn Backend>> {
    match config.hapi.backend.as_str() {
        "csv" => Ok(Arc::new(CsvBackend::new(home))),
        other => Err(KelvinError::Config {
            message: format!("unknown backend: {other}"),
        }),
    }
}

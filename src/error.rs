//! Error types for the kelvin application.
//!
//! This enum covers true faults only. Protocol-level outcomes (bad time
//! bounds, unknown dataset, and the rest of the 1400-series) are ordinary
//! values, defined in [`crate::status`] and [`crate::validate`].

use thiserror::Error;

/// The main error type for kelvin operations.
#[derive(Error, Debug)]
pub enum KelvinError {
    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Timestamp parsing errors
    #[error("Unparsable timestamp: {value}")]
    TimeParse { value: String },

    /// Metadata document errors
    #[error("Metadata error: {message}")]
    Metadata { message: String },

    /// Backend reader errors
    #[error("Backend error: {message}")]
    Backend { message: String },

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server errors
    #[error("Server error: {message}")]
    Server { message: String },
}

/// Convenience type alias for Results with KelvinError
pub type Result<T> = std::result::Result<T, KelvinError>;

//! # kelvin
//!
//! A HAPI time-series data server.
//!
//! This library provides the protocol core of a HAPI deployment: request
//! normalization and validation against per-dataset metadata, conditional-GET
//! caching, and dispatch to a pluggable backend that produces CSV data
//! buffered or as an incremental stream.
//!
//! ## Architecture
//!
//! - **Protocol layer**: path/tag normalization, version-key synonyms,
//!   time-window and parameter validation with the fixed HAPI status codes
//! - **Metadata layer**: static per-dataset JSON documents with macro-token
//!   resolution at read time
//! - **Backend layer**: one reader per deployment behind the [`backend::Backend`]
//!   trait, selected by configuration

pub mod assemble;
pub mod backend;
pub mod cache;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod metadata;
pub mod request;
pub mod state;
pub mod status;
pub mod timeutil;
pub mod validate;

pub use config::Config;
pub use error::{KelvinError, Result};
pub use logging::{create_http_trace_layer, generate_request_id, init_tracing};
pub use state::AppState;

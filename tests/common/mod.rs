//! Common test utilities for kelvin.
//!
//! This module provides shared utilities for testing the kelvin server.

// Re-export all common test utilities
pub mod hapi_home;
pub mod http_client;

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU16, Ordering};

// Each test server takes the next port so suites can run in parallel.
static NEXT_PORT: Lazy<AtomicU16> = Lazy::new(|| AtomicU16::new(9400));

/// Reserve a port for one test server
pub fn allocate_port() -> u16 {
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

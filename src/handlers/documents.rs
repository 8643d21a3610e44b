//! Verbatim protocol documents: capabilities and catalog.
//!
//! Both are static JSON files under the HAPI home, transmitted exactly as
//! they sit on disk.

use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::warn;

use crate::state::AppState;
use crate::status;

/// Handle GET hapi/capabilities requests
pub(super) fn capabilities(state: &AppState) -> Response {
    serve_document(state, "capabilities.json")
}

/// Handle GET hapi/catalog requests
pub(super) fn catalog(state: &AppState) -> Response {
    serve_document(state, "catalog.json")
}

fn serve_document(state: &AppState, name: &str) -> Response {
    match std::fs::read_to_string(state.home.join(name)) {
        Ok(body) => ([(header::CONTENT_TYPE, "application/json")], body).into_response(),
        Err(error) => {
            warn!(document = name, error = %error, "Protocol document unreadable");
            super::protocol_response(state, status::INTERNAL_ERROR)
        }
    }
}

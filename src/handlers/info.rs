//! The hapi/info endpoint.
//!
//! Returns a dataset's metadata document, filtered to the requested
//! parameter subset and with every line macro-resolved before transmission.

use std::collections::HashMap;

use axum::http::header;
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::metadata;
use crate::request;
use crate::state::AppState;
use crate::status;

/// Handle GET hapi/info requests
pub(super) fn info(
    state: &AppState,
    query: &HashMap<String, String>,
    request_id: &str,
) -> Response {
    let Some(id) = query.get("id") else {
        return super::protocol_response(state, status::USER_INPUT_ERROR);
    };

    let (found, _) = metadata::fetch(&state.home, id);
    if !found {
        debug!(dataset = %id, request_id = %request_id, "Unknown dataset id");
        return super::protocol_response(state, status::UNKNOWN_DATASET);
    }

    let parameters = request::parameters_list(query);
    let body = metadata::filtered_info(
        &state.home,
        id,
        parameters.as_deref(),
        None,
        &state.version,
    );
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

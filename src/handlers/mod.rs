//! HTTP request handlers.
//!
//! All endpoints go through one fallback GET dispatcher: HAPI paths may
//! carry allow-listed tag segments ahead of the `hapi` root, which fixed
//! routes cannot express, so the dispatcher normalizes the path itself and
//! then routes on the protocol-rooted remainder.

mod data;
mod documents;
mod info;
mod intro;

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderMap, Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use tracing::debug;

use crate::logging::generate_request_id;
use crate::request;
use crate::state::AppState;
use crate::status;

/// Handle every inbound request.
pub async fn dispatch(
    State(state): State<Arc<AppState>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    // the protocol surface is read-only; HEAD responses get their bodies
    // stripped at the transport layer
    if method != Method::GET && method != Method::HEAD {
        return StatusCode::METHOD_NOT_ALLOWED.into_response();
    }

    let request_id = generate_request_id();

    let path = request::clean_path(uri.path());
    let (tags, path) = request::extract_tags(path, &state.config.hapi.tags_allowed);
    let mut query = request::parse_query(uri.query().unwrap_or(""));
    request::apply_version_synonyms(&mut query);

    debug!(
        path = %path,
        request_id = %request_id,
        tags = ?tags,
        "Dispatching request"
    );

    match path.as_str() {
        "hapi/capabilities" => documents::capabilities(&state),
        "hapi/catalog" => documents::catalog(&state),
        "hapi/info" => info::info(&state, &query, &request_id),
        "hapi/data" => data::data(&state, &query, &tags, &headers, &request_id).await,
        "hapi" => intro::intro_page(&state),
        "" => intro::index_page(&state),
        _ => {
            // not a known URL
            debug!(path = %path, request_id = %request_id, "Unknown path");
            protocol_response_with(
                &state,
                status::USER_INPUT_ERROR,
                StatusCode::NOT_FOUND,
            )
        }
    }
}

/// Render a protocol status as its JSON body under the matching HTTP class.
pub(crate) fn protocol_response(state: &AppState, code: u16) -> Response {
    protocol_response_with(state, code, status::http_status(code))
}

/// Render a protocol status under an explicit HTTP status.
pub(crate) fn protocol_response_with(
    state: &AppState,
    code: u16,
    http: StatusCode,
) -> Response {
    (
        http,
        [(header::CONTENT_TYPE, "application/json")],
        status::status_body(&state.version, code),
    )
        .into_response()
}

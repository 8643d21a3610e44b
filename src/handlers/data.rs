//! The hapi/data endpoint.
//!
//! The full pipeline: validate the request against dataset metadata, give
//! conditional GET a chance to short-circuit, dispatch to the deployment's
//! backend (buffered or streaming), and assemble the CSV body.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Body;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::assemble;
use crate::backend::{self, BackendRequest, ChunkSink};
use crate::cache;
use crate::metadata;
use crate::request;
use crate::state::AppState;
use crate::status;
use crate::validate;

/// Handle GET hapi/data requests
pub(super) async fn data(
    state: &Arc<AppState>,
    query: &HashMap<String, String>,
    tags: &[String],
    headers: &HeaderMap,
    request_id: &str,
) -> Response {
    let start_time = Instant::now();

    let Some(id) = query.get("id") else {
        return super::protocol_response(state, status::USER_INPUT_ERROR);
    };
    let Some(time_min_raw) = query.get("time.min") else {
        return super::protocol_response(state, status::BAD_START_TIME);
    };
    let Some(time_max_raw) = query.get("time.max") else {
        return super::protocol_response(state, status::BAD_STOP_TIME);
    };
    let parameters = request::parameters_list(query);

    let validated = match validate::validate(
        &state.home,
        id,
        time_min_raw,
        time_max_raw,
        parameters.as_deref(),
        tags,
    ) {
        Ok(validated) => validated,
        Err(failure) => {
            debug!(
                dataset = %id,
                request_id = %request_id,
                code = failure.code(),
                error = %failure,
                "Request failed validation"
            );
            return super::protocol_response(state, failure.code());
        }
    };

    let last_modified = cache::last_modified(
        state.backend.as_ref(),
        id,
        &validated.time_min,
        &validated.time_max,
    );

    // conditional GET: a current client copy skips backend dispatch entirely
    if let Some(client_has) = headers
        .get(header::IF_MODIFIED_SINCE)
        .and_then(|value| value.to_str().ok())
        .and_then(cache::parse_http_date)
    {
        if cache::is_not_modified(last_modified, client_has) {
            debug!(dataset = %id, request_id = %request_id, "Not modified");
            return StatusCode::NOT_MODIFIED.into_response();
        }
    }

    let options = request::custom_options(query, &validated.info.custom_options);
    let include_header = query.get("include").map(String::as_str) == Some("header");
    let header_block = include_header.then(|| {
        metadata::filtered_info(
            &state.home,
            id,
            Some(&validated.parameters),
            Some("#"),
            &state.version,
        )
    });

    let backend_request = BackendRequest {
        dataset: id.clone(),
        time_min: validated.time_min.clone(),
        time_max: validated.time_max.clone(),
        parameters: validated.parameters.clone(),
        info: validated.info,
        options,
        stream: state.config.hapi.stream,
    };

    let response = if state.config.hapi.stream {
        streamed(state, backend_request, header_block, last_modified)
    } else {
        buffered(state, backend_request, header_block, last_modified).await
    };

    info!(
        endpoint = "hapi/data",
        dataset = %id,
        request_id = %request_id,
        duration_us = start_time.elapsed().as_micros() as u64,
        streaming = state.config.hapi.stream,
        "Data request dispatched"
    );

    response
}

/// Buffered mode: collect the whole body, clip it to the validated window,
/// and settle the final status before anything is transmitted.
async fn buffered(
    state: &Arc<AppState>,
    request: BackendRequest,
    header_block: Option<String>,
    last_modified: u64,
) -> Response {
    let time_min = request.time_min.clone();
    let time_max = request.time_max.clone();
    let (code, body) = backend::dispatch(Arc::clone(&state.backend), request, None).await;

    if code >= 1400 {
        // discard any partially assembled body
        return super::protocol_response(state, code);
    }

    let body = assemble::clip_to_window(&time_min, &time_max, &body);
    let code = assemble::finalize(code, &body, false);
    if code == status::OK_NO_DATA {
        // informational, success-shaped
        return (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "application/json".to_string()),
                (header::LAST_MODIFIED, cache::format_http_date(last_modified)),
            ],
            status::status_body(&state.version, code),
        )
            .into_response();
    }

    let mut transmitted = String::new();
    if let Some(header_block) = header_block {
        transmitted.push_str(&header_block);
    }
    transmitted.push_str(&body);

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::LAST_MODIFIED, cache::format_http_date(last_modified)),
        ],
        transmitted,
    )
        .into_response()
}

/// Streaming mode: the response commits before the backend finishes, so a
/// late backend failure is emitted in-band as the protocol error body.
fn streamed(
    state: &Arc<AppState>,
    request: BackendRequest,
    header_block: Option<String>,
    last_modified: u64,
) -> Response {
    let (sender, receiver) = mpsc::channel::<Bytes>(16);
    let backend = Arc::clone(&state.backend);
    let version = state.version.clone();

    tokio::spawn(async move {
        if let Some(header_block) = header_block {
            if sender.send(Bytes::from(header_block)).await.is_err() {
                return;
            }
        }
        let sink = ChunkSink::new(sender.clone());
        let (code, remainder) = backend::dispatch(backend, request, Some(sink)).await;
        if code >= 1400 {
            // a send failure here means the client is gone; nothing to do
            let _ = sender.send(Bytes::from(status::status_body(&version, code))).await;
            return;
        }
        if !remainder.is_empty() {
            let _ = sender.send(Bytes::from(remainder)).await;
        }
        // an empty remainder in streaming mode is expected, not "no data"
    });

    let body_stream = futures::stream::unfold(receiver, |mut receiver| async move {
        receiver
            .recv()
            .await
            .map(|chunk| (Ok::<Bytes, std::io::Error>(chunk), receiver))
    });

    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (header::LAST_MODIFIED, cache::format_http_date(last_modified)),
        ],
        Body::from_stream(body_stream),
    )
        .into_response()
}

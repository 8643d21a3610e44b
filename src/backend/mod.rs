//! The backend dispatch contract.
//!
//! A backend turns one validated request into CSV data, either buffered
//! (returned as a single string) or streamed (written to a chunk sink as it
//! is produced, with a possibly-empty buffered remainder). Backends are
//! selected once at deployment configuration time and must be safe to invoke
//! concurrently; the dispatch layer never lets a backend fault cross the
//! protocol boundary.

pub mod csv;

use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::error;

use crate::error::{KelvinError, Result};
use crate::metadata::DatasetInfo;
use crate::status;

/// Everything a backend needs to produce data for one validated request.
#[derive(Debug, Clone)]
pub struct BackendRequest {
    pub dataset: String,
    /// Canonical minute-precision bounds from validation.
    pub time_min: String,
    pub time_max: String,
    /// Final ordered parameter list, tags included as trailing names.
    pub parameters: Vec<String>,
    pub info: DatasetInfo,
    /// Validated `name=value` custom request options.
    pub options: Vec<String>,
    pub stream: bool,
}

/// Write half handed to a backend in streaming mode. Chunks are transmitted
/// to the client as they arrive.
pub struct ChunkSink {
    sender: mpsc::Sender<Bytes>,
}

impl ChunkSink {
    pub fn new(sender: mpsc::Sender<Bytes>) -> Self {
        Self { sender }
    }

    /// Send one chunk. Fails when the client has gone away; the backend
    /// should stop producing at that point.
    pub fn write(&self, chunk: &str) -> Result<()> {
        self.sender
            .blocking_send(Bytes::from(chunk.to_owned()))
            .map_err(|_| KelvinError::Backend {
                message: "client disconnected mid-stream".to_string(),
            })
    }
}

/// A data reader serving one deployment.
pub trait Backend: Send + Sync {
    /// Produce data for a validated request.
    ///
    /// Returns a protocol status code and a body. In streaming mode (`sink`
    /// present) the body may legitimately be empty: everything was already
    /// written to the sink, and an empty remainder must not be read as "no
    /// data". A returned status >= 1400 tells the caller to discard any
    /// partial body and emit the protocol error instead.
    fn fetch(&self, request: &BackendRequest, sink: Option<&ChunkSink>) -> Result<(u16, String)>;

    /// Backend-reported freshness for a window, in epoch seconds. `None`
    /// means no signal is available and callers must treat the data as
    /// always fresh.
    fn last_modified(&self, _id: &str, _time_min: &str, _time_max: &str) -> Option<u64> {
        None
    }
}

/// Run a backend on the blocking pool.
///
/// Any error or panic inside the backend surfaces as the generic internal
/// error status; raw failures never reach the wire.
pub async fn dispatch(
    backend: Arc<dyn Backend>,
    request: BackendRequest,
    sink: Option<ChunkSink>,
) -> (u16, String) {
    let dataset = request.dataset.clone();
    let handle = tokio::task::spawn_blocking(move || backend.fetch(&request, sink.as_ref()));
    match handle.await {
        Ok(Ok((code, body))) => (code, body),
        Ok(Err(fault)) => {
            error!(dataset = %dataset, error = %fault, "backend fetch failed");
            (status::INTERNAL_ERROR, String::new())
        }
        Err(join_fault) => {
            error!(dataset = %dataset, error = %join_fault, "backend task aborted");
            (status::INTERNAL_ERROR, String::new())
        }
    }
}

//! The HAPI status-code taxonomy.
//!
//! Codes are stable wire vocabulary, fixed for the life of the protocol:
//! 1200s are informational, 1400s are client input errors, 1500s are server
//! errors. They are deliberately not variants of [`crate::error::KelvinError`]
//! since a 1400-series outcome is a well-formed response, not a fault.

use axum::http::StatusCode;

pub const OK: u16 = 1200;
/// Informational pseudo-error: the request succeeded but the window holds no
/// data. Transmitted with an HTTP success status.
pub const OK_NO_DATA: u16 = 1201;

pub const USER_INPUT_ERROR: u16 = 1400;
pub const UNKNOWN_API_PARAMETER: u16 = 1401;
pub const BAD_START_TIME: u16 = 1402;
pub const BAD_STOP_TIME: u16 = 1403;
pub const EMPTY_TIME_RANGE: u16 = 1404;
pub const TIME_OUTSIDE_RANGE: u16 = 1405;
pub const UNKNOWN_DATASET: u16 = 1406;
pub const UNKNOWN_PARAMETER: u16 = 1407;
pub const TOO_MUCH_DATA: u16 = 1408;
pub const UNSUPPORTED_FORMAT: u16 = 1409;
pub const UNSUPPORTED_INCLUDE: u16 = 1410;
pub const BAD_PARAMETER_ORDER: u16 = 1411;
pub const RANGE_TOO_LONG: u16 = 1413;

pub const INTERNAL_ERROR: u16 = 1500;
pub const UPSTREAM_ERROR: u16 = 1501;

/// Look up the message for a status code.
///
/// Unknown codes fall back to the generic 1400 message so callers can always
/// produce a well-formed status body.
pub fn message(code: u16) -> &'static str {
    match code {
        OK => "HAPI OK",
        OK_NO_DATA => "HAPI OK: no data for time range",

        USER_INPUT_ERROR => "HAPI error 1400: user input error",
        UNKNOWN_API_PARAMETER => "HAPI error 1401: unknown API parameter name",
        BAD_START_TIME => "HAPI error 1402: error in start time",
        BAD_STOP_TIME => "HAPI error 1403: error in stop time",
        EMPTY_TIME_RANGE => "HAPI error 1404: start time equal to or after stop time",
        TIME_OUTSIDE_RANGE => "HAPI error 1405: time outside valid range",
        UNKNOWN_DATASET => "HAPI error 1406: unknown dataset id",
        UNKNOWN_PARAMETER => "HAPI error 1407: unknown dataset parameter",
        TOO_MUCH_DATA => "HAPI error 1408: too much time or data requested",
        UNSUPPORTED_FORMAT => "HAPI error 1409: unsupported output format",
        UNSUPPORTED_INCLUDE => "HAPI error 1410: unsupported include value",
        BAD_PARAMETER_ORDER => "HAPI error 1411: out of order or duplicate parameters",
        RANGE_TOO_LONG => "HAPI error 1413: time range too long",

        INTERNAL_ERROR => "HAPI error 1500: internal server error",
        UPSTREAM_ERROR => "HAPI error 1501: internal server error - upstream request error",

        _ => "HAPI error 1400: user input error",
    }
}

/// Map a protocol status code onto the HTTP status class it travels under.
pub fn http_status(code: u16) -> StatusCode {
    match code {
        OK | OK_NO_DATA => StatusCode::OK,
        UNKNOWN_DATASET => StatusCode::NOT_FOUND,
        c if (1400..1500).contains(&c) => StatusCode::BAD_REQUEST,
        c if c >= 1500 => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

/// Render the fixed JSON status body:
/// `{"HAPI": "<version>", "status": {"code": <int>, "message": "<string>"}}`.
pub fn status_body(version: &str, code: u16) -> String {
    serde_json::json!({
        "HAPI": version,
        "status": {
            "code": code,
            "message": message(code),
        }
    })
    .to_string()
}

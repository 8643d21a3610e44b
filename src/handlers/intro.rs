//! HTML introduction pages.
//!
//! `hapi` renders a small demo page listing every catalog dataset with
//! example info and data links; the bare root renders a one-line banner.
//! Both are plain string rendering, no templates.

use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::metadata;
use crate::state::AppState;
use crate::timeutil;

/// Handle GET hapi requests
pub(super) fn intro_page(state: &AppState) -> Response {
    let title = &state.config.hapi.title;

    // version 3 deployments advertise the newer request keys
    let (dataset_key, start_key, stop_key) = if state.is_version_3() {
        ("dataset", "start", "stop")
    } else {
        ("id", "time.min", "time.max")
    };

    let mut page = String::new();
    page.push_str(&format!(
        "<html><head><title>{title}</title></head>\n<body>\n"
    ));
    page.push_str("<p>Catalog: <a href='/hapi/catalog'>/hapi/catalog</a></p>\n");
    page.push_str("<p>HAPI requests:</p>\n");

    for id in metadata::catalog_ids(&state.home).unwrap_or_default() {
        let (found, info) = metadata::fetch(&state.home, &id);
        if !found {
            continue;
        }

        let info_url = format!("/hapi/info?{dataset_key}={id}");
        page.push_str(&format!("<a href='{info_url}'>{info_url}</a></br>\n"));

        // prefer the document's sample window when one is declared
        let (time_min, time_max) = sample_window(&info);
        let data_url = timeutil::resolve_macro_text(&format!(
            "/hapi/data?{dataset_key}={id}&{start_key}={time_min}&{stop_key}={time_max}"
        ));
        page.push_str(&format!("<a href='{data_url}'>{data_url}</a></br>\n"));

        page.push_str("Parameters:\n<table>");
        for parameter in &info.parameters {
            page.push_str(&format!(
                "<tr><td>{}:</td><td>{}</td></tr>",
                parameter.name, parameter.data_type
            ));
        }
        page.push_str("</table>\n");
    }

    page.push_str("</body></html>\n");
    ([(header::CONTENT_TYPE, "text/html")], page).into_response()
}

/// Handle GET / requests
pub(super) fn index_page(state: &AppState) -> Response {
    let title = &state.config.hapi.title;
    let page = format!(
        "<html><head><title>{title}</title></head>\n<body>\n\
         <p>{title}, visit <a href='/hapi/'>/hapi/</a> for data.\n\
         </body></html>\n"
    );
    ([(header::CONTENT_TYPE, "text/html")], page).into_response()
}

fn sample_window(info: &metadata::DatasetInfo) -> (String, String) {
    let sample_start = info
        .document
        .get("sampleStartDate")
        .and_then(serde_json::Value::as_str);
    let sample_stop = info
        .document
        .get("sampleStopDate")
        .and_then(serde_json::Value::as_str);
    match (sample_start, sample_stop) {
        (Some(start), Some(stop)) => (start.to_string(), stop.to_string()),
        _ => (info.start_date.clone(), info.stop_date.clone()),
    }
}

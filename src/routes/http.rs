// GET handlers: index, metrics, version

use axum::{
    extract::State,
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};

use super::AppState;
use crate::metrics::encode_text;
use crate::version::{NAME, VERSION, banner};

const METRICS_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// GET /: landing page pointing at /metrics.
pub(super) async fn index_handler() -> impl IntoResponse {
    Html(format!(
        "<html><head><title>{NAME}</title></head><body><h1>{}</h1>\
         <p><a href=\"/metrics\">Metrics</a></p></body></html>",
        banner()
    ))
}

/// GET /metrics: runs one collection cycle across all targets and encodes the result.
/// Client disconnect drops this future, which cancels the cycle.
pub(super) async fn metrics_handler(State(state): State<AppState>) -> Response {
    let records = state.collector.collect_all().await;
    match encode_text(&records) {
        Ok(body) => ([(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)], body).into_response(),
        Err(e) => {
            tracing::warn!(error = %e, operation = "encode_metrics", "metrics encoding failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}

/// GET /version: returns service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    axum::Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

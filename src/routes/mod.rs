// HTTP routes

mod http;

use axum::{Router, routing::get};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::collector::Collector;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) collector: Arc<Collector>,
}

pub fn app(collector: Arc<Collector>) -> Router {
    let state = AppState { collector };
    Router::new()
        .route("/", get(http::index_handler)) // GET /
        .route("/metrics", get(http::metrics_handler)) // GET /metrics
        .route("/version", get(http::version_handler)) // GET /version
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

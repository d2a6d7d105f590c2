//! HTTP request handlers.

use crate::metrics::METRICS;
use crate::state::AppState;
use axum::extract::{Request, State};
use axum::http::header::CONTENT_TYPE;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;

pub const HEALTH_BODY: &str = "I'm Healthy and I know it! ;) ";

/// Liveness probe. Fixed body, no upstream contact.
pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, HEALTH_BODY)
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut body = METRICS.render();
    body.push_str(&format!(
        "# HELP relay_uptime_seconds Seconds since the relay started.\n\
         # TYPE relay_uptime_seconds gauge\n\
         relay_uptime_seconds {}\n",
        state.start_time.elapsed().as_secs()
    ));
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        body,
    )
}

/// Every other POST: validate and fan out.
pub async fn relay(State(state): State<Arc<AppState>>, request: Request) -> Response {
    state.relay.handle(request).await
}

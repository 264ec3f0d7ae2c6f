use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::server::AppState;

/// Landing page.
pub async fn home(State(state): State<Arc<AppState>>) -> Response {
    let _timer = state.metrics.render_latency.start_timer();

    match state.renderer.index() {
        Ok(html) => Html(html).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render landing page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// Fetch a phrase from the backend and render it. Backend failures never
/// surface as a 500; they turn into the degraded page with a 502.
pub async fn get_phrase(State(state): State<Arc<AppState>>) -> Response {
    state.metrics.request_count.inc();
    let _timer = state.metrics.phrase_request_latency.start_timer();

    tracing::info!(url = %state.client.url(), "Fetching phrase from backend");

    let (status, page) = match state.client.fetch_phrase().await {
        Ok(data) => {
            state.metrics.observe_phrase(&data.phrase);
            tracing::debug!(
                phrase = %data.phrase,
                total_time = data.total_time,
                "Fetched phrase"
            );
            (StatusCode::OK, state.renderer.phrase(&data))
        }
        Err(e) => {
            state.metrics.failed_requests.inc();
            tracing::warn!(error = %e, "Failed to fetch phrase");
            (StatusCode::BAD_GATEWAY, state.renderer.degraded())
        }
    };

    match page {
        Ok(html) => (status, Html(html)).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to render phrase page");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

pub async fn healthz() -> Json<serde_json::Value> {
    Json(json!({"status": "ok"}))
}

/// Prometheus scrape endpoint.
pub async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.export() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

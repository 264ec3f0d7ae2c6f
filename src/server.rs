use std::sync::Arc;

use axum::{middleware, routing::get, Router};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::backend::PhraseClient;
use crate::config::FrontendConfig;
use crate::frontend::handlers;
use crate::frontend::headers::add_security_headers;
use crate::frontend::templates::PageRenderer;
use crate::metrics::FrontendMetrics;

pub struct AppState {
    pub config: FrontendConfig,
    pub client: PhraseClient,
    pub renderer: PageRenderer,
    pub metrics: FrontendMetrics,
}

impl AppState {
    pub fn new(config: FrontendConfig) -> crate::error::Result<Self> {
        let client = PhraseClient::new(&config.api_url(), config.request_timeout())?;
        let renderer = PageRenderer::new()?;
        let metrics = FrontendMetrics::new()?;

        Ok(Self {
            config,
            client,
            renderer,
            metrics,
        })
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    let static_files = ServeDir::new(&state.config.static_dir);

    Router::new()
        .route("/", get(handlers::home))
        .route("/get_phrase", get(handlers::get_phrase))
        .route("/healthz", get(handlers::healthz))
        .route("/metrics", get(handlers::metrics))
        .nest_service("/static", static_files)
        .layer(middleware::from_fn(add_security_headers))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

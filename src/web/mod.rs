//! Web gateway: server-rendered views, form actions and a small JSON API.

pub mod handlers;
pub mod render;
mod server;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

pub use server::GatewayServer;

use crate::llm::ResponseCache;
use crate::session::{SessionManager, ViewController};

/// Shared state for every handler.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionManager,
    pub controller: Arc<ViewController>,
    /// Exposed on `/health` when present.
    pub cache: Option<Arc<ResponseCache>>,
}

impl AppState {
    pub fn new(sessions: SessionManager, controller: ViewController) -> Self {
        Self {
            sessions,
            controller: Arc::new(controller),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

/// Build the gateway router. Request bodies above `max_body_bytes` are
/// rejected with 413.
pub fn build_router(state: AppState, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/library", get(handlers::library))
        .route("/upload", get(handlers::upload_page).post(handlers::upload))
        .route("/analyze", post(handlers::analyze))
        .route(
            "/compare",
            get(handlers::compare_page).post(handlers::compare),
        )
        .route("/compare/reset", post(handlers::reset_comparison))
        .route("/api/papers", get(handlers::api_papers))
        .route("/api/comparison", get(handlers::api_comparison))
        .route("/health", get(handlers::health))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_body_bytes)),
        )
        .with_state(state)
}

use std::sync::Arc;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{routes, state::AppState};

/// Construct the Axum [`Router`] with all routes and middleware attached.
///
/// Middleware is applied in outer-to-inner order (outermost runs first on
/// request, last on response):
///
/// 1. `TraceLayer` — structured request/response logging via `tracing`.
/// 2. `CorsLayer` — the tracker script is embedded on third-party pages, so
///    the ingestion endpoints must answer cross-origin preflights. An empty
///    `PULSETRACK_CORS_ORIGINS` allows any origin; otherwise only the
///    configured allowlist.
///
/// Per-IP rate limiting runs inside the handlers via
/// [`AppState::check_rate_limit`] so the limiter sees the forwarded client
/// address rather than the proxy socket.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = if state.config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<HeaderValue> = state
            .config
            .cors_origins
            .iter()
            .filter_map(|origin| match origin.parse() {
                Ok(value) => Some(value),
                Err(_) => {
                    tracing::warn!(origin, "ignoring unparseable CORS origin");
                    None
                }
            })
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .route("/health", get(routes::health::health))
        .route("/api/collect", post(routes::collect::collect))
        .route("/api/event", post(routes::event::event))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

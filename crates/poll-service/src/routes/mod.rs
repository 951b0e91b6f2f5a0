//! HTTP routes for the poll service.
//!
//! Defines the Axum router and application state.

use crate::config::Config;
use crate::handlers;
use crate::middleware::{http_metrics_middleware, optional_participant, require_participant};
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: PgPool,

    /// Service configuration.
    pub config: Config,
}

/// Build the application routes.
///
/// - `/health`, `/metrics` - Operational, unversioned, no identity
/// - `GET /api/v1/polls` - Identity optional
/// - `POST /api/v1/polls`, `POST /api/v1/polls/:poll_id/votes`,
///   `POST /api/v1/polls/:poll_id/close` - Identity required
pub fn build_routes(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let request_timeout = Duration::from_secs(state.config.request_timeout_seconds);

    let public_routes = Router::new()
        .route("/health", get(handlers::health_check))
        .with_state(state.clone());

    let metrics_routes = Router::new()
        .route("/metrics", get(handlers::metrics_handler))
        .with_state(metrics_handle);

    let read_routes = Router::new()
        .route("/api/v1/polls", get(handlers::list_polls))
        .route_layer(middleware::from_fn(optional_participant))
        .with_state(state.clone());

    let write_routes = Router::new()
        .route("/api/v1/polls", post(handlers::create_poll))
        .route("/api/v1/polls/:poll_id/votes", post(handlers::cast_vote))
        .route("/api/v1/polls/:poll_id/close", post(handlers::close_poll))
        .route_layer(middleware::from_fn(require_participant))
        .with_state(state);

    // Layer order (bottom-to-top execution):
    // 1. TimeoutLayer (innermost)
    // 2. TraceLayer
    // 3. http_metrics_middleware (outermost, sees every response)
    public_routes
        .merge(metrics_routes)
        .merge(read_routes)
        .merge(write_routes)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(request_timeout))
        .layer(middleware::from_fn(http_metrics_middleware))
}

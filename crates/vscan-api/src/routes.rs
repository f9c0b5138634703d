//! API routes.

use axum::middleware;
use axum::routing::{delete, get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers::{
    clear_queue, delete_file, enqueue, get_duration, get_durations, get_status, health, move_file,
    ready, refresh_library, search_library,
};
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::sse::events;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let processing_routes = Router::new()
        .route("/processing/status", get(get_status))
        .route("/processing/queue", post(enqueue).delete(clear_queue));

    let library_routes = Router::new()
        .route("/library/search", post(search_library))
        .route("/library/refresh", post(refresh_library))
        .route("/library/move", post(move_file))
        .route("/library/duration", get(get_duration))
        .route("/library/durations", post(get_durations))
        .route("/files/*path", delete(delete_file));

    let api_routes = Router::new()
        .route("/events", get(events))
        .merge(processing_routes)
        .merge(library_routes);

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/healthz", get(health))
        .route("/ready", get(ready));

    // Metrics endpoint (if enabled)
    let metrics_routes = if let Some(handle) = metrics_handle {
        Router::new().route("/metrics", get(move || async move { handle.render() }))
    } else {
        Router::new()
    };

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(metrics_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}

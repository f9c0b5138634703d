//! Prometheus metrics for the API server.

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use std::time::Instant;

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "vscan_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "vscan_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "vscan_http_requests_in_flight";

    // Event stream metrics
    pub const SSE_CONNECTIONS_TOTAL: &str = "vscan_sse_connections_total";
    pub const SSE_CONNECTIONS_ACTIVE: &str = "vscan_sse_connections_active";
    pub const SSE_EVENTS_SENT: &str = "vscan_sse_events_sent_total";

    // Telemetry metrics
    pub const WORKER_STATS_POLLS_TOTAL: &str = "vscan_worker_stats_polls_total";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record a new event stream connection.
pub fn record_sse_connection() {
    counter!(names::SSE_CONNECTIONS_TOTAL).increment(1);
    gauge!(names::SSE_CONNECTIONS_ACTIVE).increment(1.0);
}

/// Record an event stream disconnect.
pub fn record_sse_disconnect() {
    gauge!(names::SSE_CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record an event written to a stream.
pub fn record_sse_event(event_type: &'static str) {
    counter!(names::SSE_EVENTS_SENT, "type" => event_type).increment(1);
}

/// Record a worker stats poll.
pub fn record_stats_poll(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(names::WORKER_STATS_POLLS_TOTAL, "outcome" => outcome).increment(1);
}

/// Sanitize path for metrics labels (collapse file paths).
fn sanitize_path(path: &str) -> String {
    if path.starts_with("/api/files/") {
        "/api/files/:path".to_string()
    } else {
        path.to_string()
    }
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    // Increment in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);

    let response = next.run(request).await;

    // Decrement in-flight counter
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}

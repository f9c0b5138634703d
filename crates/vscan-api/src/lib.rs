//! Axum HTTP/SSE server for the vscan backend.
//!
//! This crate provides:
//! - The processing queue and library HTTP API
//! - The `/api/events` Server-Sent Events stream
//! - Background telemetry polling and post-processing library refresh
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod sse;
pub mod state;

pub use config::{ApiConfig, AppConfig, TelemetryConfig};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use services::{LibrarySync, TelemetryPoller};
pub use state::AppState;

//! API configuration.

use std::time::Duration;

use vscan_library::{LibraryConfig, MetadataConfig};
use vscan_ml_client::MlClientConfig;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// CORS origins
    pub cors_origins: Vec<String>,
    /// Max request body size
    pub max_body_size: usize,
    /// Environment (development/production)
    pub environment: String,
    /// Per-subscriber event buffer
    pub event_buffer: usize,
    /// Serve Prometheus metrics at /metrics
    pub metrics_enabled: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec!["*".to_string()],
            max_body_size: 1024 * 1024, // 1MB
            environment: "development".to_string(),
            event_buffer: 256,
            metrics_enabled: true,
        }
    }
}

impl ApiConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("API_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("API_PORT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(8000),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|s| s.trim().to_string()).collect())
                .unwrap_or_else(|_| vec!["*".to_string()]),
            max_body_size: std::env::var("MAX_BODY_SIZE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(1024 * 1024),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            event_buffer: std::env::var("EVENT_BUFFER")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(256),
            metrics_enabled: std::env::var("METRICS_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
        }
    }

    /// Check if running in production mode.
    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase() == "production"
    }
}

/// Worker telemetry polling configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub enabled: bool,
    pub interval: Duration,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(5),
        }
    }
}

impl TelemetryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("STATS_POLL_ENABLED")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(true),
            interval: Duration::from_secs(
                std::env::var("STATS_POLL_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

/// Everything the server needs to build its services.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub library: LibraryConfig,
    pub metadata: MetadataConfig,
    pub worker: MlClientConfig,
    pub telemetry: TelemetryConfig,
    /// ffprobe binary name or path
    pub ffprobe_path: String,
}

impl AppConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let library = LibraryConfig::from_env();
        let metadata = MetadataConfig::from_env(&library.root);
        Self {
            api: ApiConfig::from_env(),
            library,
            metadata,
            worker: MlClientConfig::from_env(),
            telemetry: TelemetryConfig::from_env(),
            ffprobe_path: std::env::var("FFPROBE_PATH").unwrap_or_else(|_| "ffprobe".to_string()),
        }
    }

    /// Defaults rooted at `root`, talking to the worker at `worker_url`.
    pub fn for_root(root: impl Into<std::path::PathBuf>, worker_url: impl Into<String>) -> Self {
        let library = LibraryConfig::with_root(root);
        let metadata = MetadataConfig {
            file: library.root.join("metadata.json"),
            ..MetadataConfig::default()
        };
        Self {
            api: ApiConfig::default(),
            library,
            metadata,
            worker: MlClientConfig::with_base_url(worker_url),
            telemetry: TelemetryConfig::default(),
            ffprobe_path: "ffprobe".to_string(),
        }
    }
}

//! Axum API server binary.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vscan_api::{create_router, metrics, AppConfig, AppState, LibrarySync, TelemetryPoller};
use vscan_library::LibraryWatcher;

#[tokio::main]
async fn main() {
    // Load environment variables
    dotenvy::dotenv().ok();

    init_tracing();

    if let Err(e) = run().await {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }
}

fn init_tracing() {
    // Colored output for dev, JSON for production
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("vscan=info"));

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

async fn run() -> anyhow::Result<()> {
    info!("Starting vscan-api");

    // Load configuration
    let config = AppConfig::from_env();
    info!(
        "API config: host={}, port={}, library={}, worker={}",
        config.api.host,
        config.api.port,
        config.library.root.display(),
        config.worker.base_url
    );

    // Create application state
    let state = AppState::new(&config).await?;

    // Initialize metrics
    let metrics_handle = if config.api.metrics_enabled {
        match metrics::init_metrics() {
            Ok(handle) => {
                info!("Prometheus metrics enabled at /metrics");
                Some(handle)
            }
            Err(e) => {
                warn!("Failed to install Prometheus recorder: {}", e);
                None
            }
        }
    } else {
        None
    };

    // Initial library scan
    if let Err(e) = state.library.refresh().await {
        warn!("Initial library scan failed: {}", e);
    }

    // Background tasks
    let library_sync = LibrarySync::new(Arc::clone(&state.library), &state.events);
    tokio::spawn(library_sync.run());

    let telemetry = TelemetryPoller::new(
        Arc::clone(&state.worker),
        Arc::clone(&state.events),
        &config.telemetry,
    );
    tokio::spawn(async move {
        telemetry.run().await;
    });

    let metadata = Arc::clone(&state.metadata);
    let flush_interval = config.metadata.flush_interval;
    let flusher = tokio::spawn(async move {
        metadata.run_flusher(flush_interval).await;
    });

    let _watcher = if config.library.watch {
        match LibraryWatcher::start(Arc::clone(&state.library), config.library.watch_debounce) {
            Ok(watcher) => Some(watcher),
            Err(e) => {
                warn!("Library watcher unavailable, continuing without it: {}", e);
                None
            }
        }
    } else {
        info!("Library watching is disabled");
        None
    };

    // Create router
    let app = create_router(state.clone(), metrics_handle);

    // Bind and serve
    let addr: SocketAddr = format!("{}:{}", config.api.host, config.api.port).parse()?;

    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Flush as soon as the signal arrives; open event streams can hold the
    // graceful drain open indefinitely.
    let metadata = Arc::clone(&state.metadata);
    let shutdown = async move {
        shutdown_signal().await;
        flusher.abort();
        match metadata.flush().await {
            Ok(true) => info!("Metadata cache flushed"),
            Ok(false) => {}
            Err(e) => error!("Final metadata flush failed: {}", e),
        }
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to install CTRL+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received shutdown signal");
}

//! Background service polling worker telemetry.
//!
//! Every tick fetches `GET {worker}/stats` and publishes the document as a
//! `gpu_stats` event. Failures are expected while the worker is down and
//! are only logged at debug level.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use vscan_events::EventBus;
use vscan_ml_client::MlClient;
use vscan_models::Event;

use crate::config::TelemetryConfig;
use crate::metrics;

/// Worker telemetry poller.
pub struct TelemetryPoller {
    worker: Arc<MlClient>,
    events: Arc<EventBus>,
    interval: Duration,
    enabled: bool,
}

impl TelemetryPoller {
    pub fn new(worker: Arc<MlClient>, events: Arc<EventBus>, config: &TelemetryConfig) -> Self {
        Self {
            worker,
            events,
            interval: config.interval,
            enabled: config.enabled,
        }
    }

    /// Start the polling loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        if !self.enabled {
            info!("Worker telemetry polling is disabled");
            return;
        }

        info!("Starting worker telemetry poller (interval: {:?})", self.interval);

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(e) = self.poll_once().await {
                debug!("Worker stats unavailable: {}", e);
            }
        }
    }

    /// Fetch stats once and publish them.
    pub async fn poll_once(&self) -> anyhow::Result<()> {
        match self.worker.stats().await {
            Ok(stats) => {
                metrics::record_stats_poll(true);
                self.events.publish(Event::Telemetry(stats));
                Ok(())
            }
            Err(e) => {
                metrics::record_stats_poll(false);
                Err(e.into())
            }
        }
    }
}

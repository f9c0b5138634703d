//! Application state.

use std::sync::Arc;

use vscan_events::EventBus;
use vscan_library::{LibraryIndex, MetadataCache};
use vscan_media::FfprobeDuration;
use vscan_ml_client::MlClient;
use vscan_queue::ProcessingQueue;

use crate::config::{ApiConfig, AppConfig};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub events: Arc<EventBus>,
    pub library: Arc<LibraryIndex>,
    pub metadata: Arc<MetadataCache>,
    pub queue: ProcessingQueue,
    pub worker: Arc<MlClient>,
}

impl AppState {
    /// Build every service from configuration.
    ///
    /// The library starts empty; call [`LibraryIndex::refresh`] to populate it.
    pub async fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let events = Arc::new(EventBus::new(config.api.event_buffer));
        let worker = Arc::new(MlClient::new(config.worker.clone())?);
        let library = Arc::new(LibraryIndex::new(&config.library, Arc::clone(&events)));

        let probe = Arc::new(FfprobeDuration::new(config.ffprobe_path.as_str()));
        let metadata = Arc::new(
            MetadataCache::load(&config.library.root, &config.metadata.file, probe).await,
        );

        let queue = ProcessingQueue::new(
            &config.library.root,
            Arc::clone(&worker),
            Arc::clone(&events),
        );

        Ok(Self {
            config: config.api.clone(),
            events,
            library,
            metadata,
            queue,
            worker,
        })
    }
}

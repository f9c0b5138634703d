//! Refreshes the library index after each processed video.

use std::sync::Arc;

use tracing::{debug, info, warn};

use vscan_events::{EventBus, Subscription};
use vscan_library::LibraryIndex;
use vscan_models::Event;

/// Listens on the event bus for `video_processed` and rescans the library.
pub struct LibrarySync {
    library: Arc<LibraryIndex>,
    subscription: Subscription,
}

impl LibrarySync {
    /// Subscribe now so no event published after construction is missed.
    pub fn new(library: Arc<LibraryIndex>, events: &EventBus) -> Self {
        Self {
            library,
            subscription: events.subscribe(),
        }
    }

    /// Run until the bus drops the subscription.
    ///
    /// This function should be spawned as a background task.
    pub async fn run(mut self) {
        info!("Starting library sync");

        while let Some(event) = self.subscription.recv().await {
            if let Event::VideoProcessed { path } = event {
                debug!(path = %path, "Video processed, refreshing library");
                if let Err(e) = self.library.refresh().await {
                    warn!(error = %e, "Library refresh after processing failed");
                }
            }
        }
    }
}

//! Debounced filesystem watching for the library root.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use notify::{Event as FsEvent, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vscan_media::is_video;

use crate::error::LibraryResult;
use crate::index::LibraryIndex;

/// Refreshes a [`LibraryIndex`] after changes under its root settle.
///
/// Only media files and extension-less paths (directories) count as
/// changes; result sidecars and the metadata file are ignored. Dropping the
/// watcher stops it.
pub struct LibraryWatcher {
    _watcher: RecommendedWatcher,
    task: JoinHandle<()>,
}

impl LibraryWatcher {
    /// Start watching the index root recursively.
    pub fn start(index: Arc<LibraryIndex>, debounce: Duration) -> LibraryResult<Self> {
        // One pending signal is enough; the refresh rescans everything.
        let (tx, rx) = mpsc::channel::<()>(1);

        let mut watcher = notify::recommended_watcher(move |result: notify::Result<FsEvent>| {
            match result {
                Ok(event) if is_relevant(&event) => {
                    let _ = tx.try_send(());
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Library watcher error"),
            }
        })?;
        watcher.watch(index.root(), RecursiveMode::Recursive)?;

        info!(
            root = %index.root().display(),
            debounce_ms = debounce.as_millis() as u64,
            "Watching library for changes"
        );

        let task = tokio::spawn(debounce_refresh(rx, index, debounce));
        Ok(Self {
            _watcher: watcher,
            task,
        })
    }
}

impl Drop for LibraryWatcher {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn debounce_refresh(mut rx: mpsc::Receiver<()>, index: Arc<LibraryIndex>, debounce: Duration) {
    while rx.recv().await.is_some() {
        loop {
            match tokio::time::timeout(debounce, rx.recv()).await {
                Ok(Some(())) => continue,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        debug!("Library changed on disk, refreshing");
        if let Err(e) = index.refresh().await {
            warn!(error = %e, "Watched refresh failed");
        }
    }
}

fn is_relevant(event: &FsEvent) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    event.paths.iter().any(|path| is_relevant_path(path))
}

fn is_relevant_path(path: &Path) -> bool {
    is_video(path) || path.extension().is_none()
}

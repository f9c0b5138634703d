//! Persisted duration cache.
//!
//! Durations are probed lazily, kept in memory and written back to a flat
//! JSON file (`path -> {"duration": seconds}`) by a periodic flush.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};
use vscan_media::DurationProbe;
use vscan_models::{validate_relative_path, MetadataRecord};

use crate::error::LibraryResult;
use crate::metrics;

/// Lazily filled `relative path -> metadata` cache.
pub struct MetadataCache {
    root: PathBuf,
    file: PathBuf,
    records: DashMap<String, MetadataRecord>,
    dirty: AtomicBool,
    flush_lock: Mutex<()>,
    probe: Arc<dyn DurationProbe>,
}

impl MetadataCache {
    /// Load the cache from `file`. A missing or corrupt file yields an empty cache.
    pub async fn load(
        root: impl Into<PathBuf>,
        file: impl Into<PathBuf>,
        probe: Arc<dyn DurationProbe>,
    ) -> Self {
        let file = file.into();
        let records = read_records(&file).await;

        Self {
            root: root.into(),
            file,
            records: records.into_iter().collect(),
            dirty: AtomicBool::new(false),
            flush_lock: Mutex::new(()),
            probe,
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether there are changes not yet flushed.
    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    /// Cached record for a path, without probing.
    pub fn get(&self, path: &str) -> Option<MetadataRecord> {
        self.records.get(path).map(|r| *r)
    }

    /// Duration of the media file at relative `path`, probing on a miss.
    ///
    /// Failed probes are not cached and are retried on the next call.
    pub async fn get_duration(&self, path: &str) -> Option<f64> {
        let rel = match validate_relative_path(path) {
            Ok(rel) => rel,
            Err(e) => {
                debug!(path = %path, error = %e, "Refusing duration lookup");
                return None;
            }
        };

        if let Some(duration) = self.records.get(rel).and_then(|r| r.duration) {
            metrics::record_lookup("hit");
            return Some(duration);
        }

        match self.probe.probe_duration(&self.root.join(rel)).await {
            Ok(duration) => {
                metrics::record_lookup("miss");
                self.records
                    .insert(rel.to_string(), MetadataRecord::with_duration(duration));
                self.dirty.store(true, Ordering::Release);
                Some(duration)
            }
            Err(e) => {
                metrics::record_lookup("failed");
                warn!(path = %rel, error = %e, "Duration probe failed");
                None
            }
        }
    }

    /// Durations for several paths, probing misses concurrently.
    pub async fn get_durations(&self, paths: &[String]) -> BTreeMap<String, Option<f64>> {
        join_all(paths.iter().map(|path| async move {
            (path.clone(), self.get_duration(path).await)
        }))
        .await
        .into_iter()
        .collect()
    }

    /// Write the cache to disk if it changed since the last flush.
    ///
    /// Returns whether a write happened. Flushes never overlap; a failed
    /// write leaves the cache dirty.
    pub async fn flush(&self) -> LibraryResult<bool> {
        let _guard = self.flush_lock.lock().await;

        if !self.dirty.swap(false, Ordering::AcqRel) {
            return Ok(false);
        }

        let snapshot: BTreeMap<String, MetadataRecord> = self
            .records
            .iter()
            .map(|entry| (entry.key().clone(), *entry.value()))
            .collect();

        match write_atomic(&self.file, &snapshot).await {
            Ok(()) => {
                metrics::record_flush(true);
                debug!(records = snapshot.len(), file = %self.file.display(), "Metadata flushed");
                Ok(true)
            }
            Err(e) => {
                metrics::record_flush(false);
                self.dirty.store(true, Ordering::Release);
                Err(e)
            }
        }
    }

    /// Flush at a fixed interval. Runs until the task is dropped.
    pub async fn run_flusher(&self, period: Duration) {
        info!("Starting metadata flusher (interval: {:?})", period);

        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        ticker.tick().await;

        loop {
            ticker.tick().await;

            if let Err(e) = self.flush().await {
                warn!(file = %self.file.display(), error = %e, "Metadata flush failed");
            }
        }
    }
}

async fn read_records(file: &Path) -> HashMap<String, MetadataRecord> {
    let text = match tokio::fs::read_to_string(file).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(file = %file.display(), "No metadata cache yet, starting empty");
            return HashMap::new();
        }
        Err(e) => {
            warn!(file = %file.display(), error = %e, "Metadata cache unreadable, starting empty");
            return HashMap::new();
        }
    };

    match serde_json::from_str::<HashMap<String, MetadataRecord>>(&text) {
        Ok(records) => {
            info!(records = records.len(), "Metadata cache loaded");
            records
        }
        Err(e) => {
            warn!(file = %file.display(), error = %e, "Metadata cache corrupt, starting empty");
            HashMap::new()
        }
    }
}

async fn write_atomic(file: &Path, records: &BTreeMap<String, MetadataRecord>) -> LibraryResult<()> {
    let bytes = serde_json::to_vec(records)?;

    if let Some(parent) = file.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }

    let mut tmp = file.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, file).await?;
    Ok(())
}

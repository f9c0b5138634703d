//! In-memory index of media files under the library root.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use vscan_events::EventBus;
use vscan_media::{is_video, legacy_result_path, result_path};
use vscan_models::{to_posix_path, validate_relative_path, Event, LibraryEntry};
use walkdir::WalkDir;

use crate::config::{LibraryConfig, MoveRule};
use crate::error::{LibraryError, LibraryResult};
use crate::metrics;
use crate::natural::natural_cmp;
use crate::query::{LibraryQuery, SearchItem, SearchPage};

/// Ordered snapshot of the media library.
///
/// The snapshot is replaced whole on every change, so readers holding an
/// `Arc` from [`LibraryIndex::list`] never see a partially built list.
pub struct LibraryIndex {
    root: PathBuf,
    move_rules: Vec<MoveRule>,
    snapshot: RwLock<Arc<Vec<LibraryEntry>>>,
    refresh_lock: Mutex<()>,
    events: Arc<EventBus>,
}

impl LibraryIndex {
    /// Create an empty index. Call [`LibraryIndex::refresh`] to populate it.
    pub fn new(config: &LibraryConfig, events: Arc<EventBus>) -> Self {
        Self {
            root: config.root.clone(),
            move_rules: config.move_rules.clone(),
            snapshot: RwLock::new(Arc::new(Vec::new())),
            refresh_lock: Mutex::new(()),
            events,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current snapshot.
    pub fn list(&self) -> Arc<Vec<LibraryEntry>> {
        self.snapshot.read().clone()
    }

    pub fn len(&self) -> usize {
        self.snapshot.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a single entry by relative path.
    pub fn get(&self, path: &str) -> Option<LibraryEntry> {
        self.snapshot.read().iter().find(|e| e.path == path).cloned()
    }

    /// Absolute location of a client-supplied relative path.
    pub fn resolve(&self, path: &str) -> LibraryResult<PathBuf> {
        let rel = validate_relative_path(path)?;
        Ok(self.root.join(rel))
    }

    /// Rescan the root and swap in the new snapshot.
    ///
    /// Concurrent refreshes run one at a time. On failure the previous
    /// snapshot stays in place. Publishes `LibraryUpdated` on success.
    pub async fn refresh(&self) -> LibraryResult<usize> {
        let _guard = self.refresh_lock.lock().await;
        let started = Instant::now();
        let root = self.root.clone();

        let scanned = tokio::task::spawn_blocking(move || scan(&root))
            .await
            .map_err(|e| LibraryError::Task(e.to_string()))
            .and_then(|result| result);

        let elapsed = started.elapsed().as_secs_f64();
        match scanned {
            Ok(entries) => {
                let count = entries.len();
                self.swap(entries);
                metrics::record_refresh(true, elapsed, Some(count));
                info!(count, elapsed_ms = (elapsed * 1000.0) as u64, "Library refreshed");
                self.events.publish(Event::library_updated());
                Ok(count)
            }
            Err(e) => {
                metrics::record_refresh(false, elapsed, None);
                error!(root = %self.root.display(), error = %e, "Library refresh failed");
                Err(e)
            }
        }
    }

    /// Drop an entry without rescanning. Returns false if it was not indexed.
    pub fn remove(&self, path: &str) -> bool {
        let mut snapshot = self.snapshot.write();
        if !snapshot.iter().any(|e| e.path == path) {
            return false;
        }
        let next: Vec<LibraryEntry> = snapshot.iter().filter(|e| e.path != path).cloned().collect();
        *snapshot = Arc::new(next);
        true
    }

    /// Re-key an entry without rescanning. Returns false if it was not indexed.
    pub fn rename(&self, path: &str, new_path: &str) -> bool {
        let mut snapshot = self.snapshot.write();
        if !snapshot.iter().any(|e| e.path == path) {
            return false;
        }
        if path == new_path {
            return true;
        }

        // An existing entry at the destination is replaced.
        let mut next: Vec<LibraryEntry> = snapshot
            .iter()
            .filter(|e| e.path != new_path)
            .cloned()
            .collect();
        let Some(entry) = next.iter_mut().find(|e| e.path == path) else {
            return false;
        };
        entry.path = new_path.to_string();
        entry.name = new_path.rsplit('/').next().unwrap_or(new_path).to_string();
        sort_entries(&mut next);
        *snapshot = Arc::new(next);
        true
    }

    /// Filter, sort and paginate the snapshot, flagging processed files.
    pub async fn search(&self, query: &LibraryQuery) -> SearchPage {
        let snapshot = self.list();
        let (page_entries, total) = query.select(&snapshot);

        let items = join_all(page_entries.into_iter().map(|entry| async move {
            let processed = has_result(&self.root.join(&entry.path)).await;
            SearchItem { entry, processed }
        }))
        .await;

        SearchPage {
            items,
            total,
            page: query.page(),
            limit: query.limit(),
        }
    }

    /// Delete a media file and its result sidecar, then drop it from the index.
    pub async fn delete_file(&self, path: &str) -> LibraryResult<()> {
        let rel = validate_relative_path(path)?;
        let full = self.root.join(rel);

        tokio::fs::remove_file(&full)
            .await
            .map_err(|e| LibraryError::io_for(rel, e))?;

        if let Err(e) = tokio::fs::remove_file(result_path(&full)).await {
            debug!(path = %rel, error = %e, "No result sidecar removed");
        }

        self.remove(rel);
        info!(path = %rel, "Deleted media file");
        Ok(())
    }

    /// Move a media file according to the first matching move rule.
    ///
    /// Returns the new relative path.
    pub async fn move_file(&self, path: &str) -> LibraryResult<String> {
        let rel = validate_relative_path(path)?;
        let dest = self
            .move_rules
            .iter()
            .find_map(|rule| rule.apply(rel))
            .ok_or_else(|| LibraryError::NoMoveRule(rel.to_string()))?;

        let src_full = self.root.join(rel);
        let dest_full = self.root.join(&dest);

        if let Some(parent) = dest_full.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::rename(&src_full, &dest_full)
            .await
            .map_err(|e| LibraryError::io_for(rel, e))?;

        if let Err(e) = tokio::fs::rename(result_path(&src_full), result_path(&dest_full)).await {
            debug!(path = %rel, error = %e, "No result sidecar moved");
        }

        self.rename(rel, &dest);
        info!(from = %rel, to = %dest, "Moved media file");
        Ok(dest)
    }

    fn swap(&self, entries: Vec<LibraryEntry>) {
        *self.snapshot.write() = Arc::new(entries);
    }
}

/// Walk `root` and collect media files, sorted.
///
/// An unreadable root fails the scan; anything unreadable below it is skipped.
fn scan(root: &Path) -> LibraryResult<Vec<LibraryEntry>> {
    std::fs::read_dir(root).map_err(|source| LibraryError::RootUnreadable {
        root: root.to_path_buf(),
        source,
    })?;

    let mut entries = Vec::new();
    for item in WalkDir::new(root).min_depth(1) {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "Skipping unreadable library entry");
                continue;
            }
        };
        if !item.file_type().is_file() || !is_video(item.path()) {
            continue;
        }

        let metadata = match item.metadata() {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(path = %item.path().display(), error = %e, "Skipping file without metadata");
                continue;
            }
        };
        let Ok(rel) = item.path().strip_prefix(root) else {
            continue;
        };

        entries.push(LibraryEntry {
            path: to_posix_path(rel),
            name: item.file_name().to_string_lossy().into_owned(),
            size: metadata.len(),
            modified_at: metadata
                .modified()
                .map(DateTime::<Utc>::from)
                .unwrap_or_else(|_| DateTime::<Utc>::from(std::time::UNIX_EPOCH)),
        });
    }

    sort_entries(&mut entries);
    Ok(entries)
}

fn sort_entries(entries: &mut [LibraryEntry]) {
    entries.sort_by(|a, b| natural_cmp(&a.name, &b.name).then_with(|| a.path.cmp(&b.path)));
}

/// Whether a non-empty detection result exists for the media file at `full`.
async fn has_result(full: &Path) -> bool {
    match tokio::fs::metadata(result_path(full)).await {
        Ok(metadata) => metadata.len() > 0,
        Err(_) => match legacy_result_path(full) {
            Some(legacy) => tokio::fs::metadata(legacy)
                .await
                .map(|m| m.len() > 0)
                .unwrap_or(false),
            None => false,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str, bytes: &[u8]) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, bytes).unwrap();
    }

    fn fixture() -> (TempDir, LibraryIndex, Arc<EventBus>) {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "cam1/clip10.mp4", b"0123456789");
        touch(dir.path(), "cam1/clip2.MOV", b"01");
        touch(dir.path(), "cam2/Clip2.mkv", b"0");
        touch(dir.path(), "cam1/clip2.MOV.json", b"{}");
        touch(dir.path(), "notes.txt", b"hello");
        let bus = Arc::new(EventBus::new(16));
        let index = LibraryIndex::new(&LibraryConfig::with_root(dir.path()), bus.clone());
        (dir, index, bus)
    }

    fn paths(index: &LibraryIndex) -> Vec<String> {
        index.list().iter().map(|e| e.path.clone()).collect()
    }

    #[tokio::test]
    async fn test_refresh_indexes_media_in_natural_order() {
        let (_dir, index, bus) = fixture();
        let mut sub = bus.subscribe();

        assert_eq!(index.refresh().await.unwrap(), 3);
        assert_eq!(paths(&index), vec!["cam2/Clip2.mkv", "cam1/clip2.MOV", "cam1/clip10.mp4"]);
        assert_eq!(index.get("cam1/clip10.mp4").unwrap().size, 10);
        assert!(matches!(sub.try_recv(), Some(Event::LibraryUpdated { .. })));
    }

    #[tokio::test]
    async fn test_unchanged_refresh_still_publishes() {
        let (_dir, index, bus) = fixture();
        index.refresh().await.unwrap();
        let mut sub = bus.subscribe();

        index.refresh().await.unwrap();
        assert!(matches!(sub.try_recv(), Some(Event::LibraryUpdated { .. })));
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_snapshot() {
        let (dir, index, bus) = fixture();
        index.refresh().await.unwrap();
        let before = index.list();
        let mut sub = bus.subscribe();

        fs::remove_dir_all(dir.path()).unwrap();
        assert!(matches!(
            index.refresh().await,
            Err(LibraryError::RootUnreadable { .. })
        ));
        assert_eq!(*index.list(), *before);
        assert!(sub.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_remove_and_rename_swap_snapshot() {
        let (_dir, index, _bus) = fixture();
        index.refresh().await.unwrap();
        let held = index.list();

        assert!(index.remove("cam2/Clip2.mkv"));
        assert!(!index.remove("cam2/Clip2.mkv"));
        assert_eq!(held.len(), 3);
        assert_eq!(index.len(), 2);

        assert!(index.rename("cam1/clip10.mp4", "archive/a1.mp4"));
        assert_eq!(paths(&index), vec!["archive/a1.mp4", "cam1/clip2.MOV"]);
        assert_eq!(index.get("archive/a1.mp4").unwrap().name, "a1.mp4");
        assert!(!index.rename("missing.mp4", "x.mp4"));
    }

    #[tokio::test]
    async fn test_rename_to_same_path_keeps_entries() {
        let (_dir, index, _bus) = fixture();
        index.refresh().await.unwrap();
        let before = paths(&index);

        assert!(index.rename("cam1/clip10.mp4", "cam1/clip10.mp4"));
        assert!(index.rename("cam2/Clip2.mkv", "cam2/Clip2.mkv"));
        assert_eq!(paths(&index), before);
    }

    #[tokio::test]
    async fn test_rename_onto_existing_entry_replaces_it() {
        let (_dir, index, _bus) = fixture();
        index.refresh().await.unwrap();

        assert!(index.rename("cam1/clip10.mp4", "cam1/clip2.MOV"));
        assert_eq!(paths(&index), vec!["cam2/Clip2.mkv", "cam1/clip2.MOV"]);
        assert_eq!(index.get("cam1/clip2.MOV").unwrap().size, 10);
    }

    #[tokio::test]
    async fn test_search_flags_processed() {
        let (dir, index, _bus) = fixture();
        touch(dir.path(), "cam2/Clip2.json", b"[]");
        touch(dir.path(), "cam1/clip10.mp4.json", b"");
        index.refresh().await.unwrap();

        let page = index.search(&LibraryQuery::default()).await;
        assert_eq!(page.total, 3);
        let processed: Vec<(String, bool)> = page
            .items
            .iter()
            .map(|i| (i.entry.path.clone(), i.processed))
            .collect();
        assert_eq!(
            processed,
            vec![
                ("cam2/Clip2.mkv".to_string(), true),
                ("cam1/clip2.MOV".to_string(), true),
                ("cam1/clip10.mp4".to_string(), false),
            ]
        );
    }

    #[tokio::test]
    async fn test_delete_file_removes_media_and_sidecar() {
        let (dir, index, _bus) = fixture();
        index.refresh().await.unwrap();

        index.delete_file("cam1/clip2.MOV").await.unwrap();
        assert!(!dir.path().join("cam1/clip2.MOV").exists());
        assert!(!dir.path().join("cam1/clip2.MOV.json").exists());
        assert!(index.get("cam1/clip2.MOV").is_none());

        assert!(matches!(
            index.delete_file("../etc/passwd").await,
            Err(LibraryError::InvalidPath(_))
        ));
        assert!(matches!(
            index.delete_file("cam1/gone.mp4").await,
            Err(LibraryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_move_file_applies_rule() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "NVR-blank/cam/a.mp4", b"x");
        touch(dir.path(), "NVR-blank/cam/a.mp4.json", b"{}");
        touch(dir.path(), "other/b.mp4", b"x");
        let index = LibraryIndex::new(
            &LibraryConfig::with_root(dir.path()),
            Arc::new(EventBus::default()),
        );
        index.refresh().await.unwrap();

        let dest = index.move_file("NVR-blank/cam/a.mp4").await.unwrap();
        assert_eq!(dest, "NVR-upload/cam/a.mp4");
        assert!(dir.path().join("NVR-upload/cam/a.mp4").exists());
        assert!(dir.path().join("NVR-upload/cam/a.mp4.json").exists());
        assert!(index.get("NVR-upload/cam/a.mp4").is_some());
        assert!(index.get("NVR-blank/cam/a.mp4").is_none());

        assert!(matches!(
            index.move_file("other/b.mp4").await,
            Err(LibraryError::NoMoveRule(_))
        ));
    }
}

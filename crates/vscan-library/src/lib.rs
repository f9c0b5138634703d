//! Media library state for the vscan backend.
//!
//! This crate provides:
//! - [`LibraryIndex`]: an ordered, copy-on-write snapshot of media files on disk
//! - [`MetadataCache`]: a persisted `path -> duration` cache filled by ffprobe
//! - [`LibraryWatcher`]: debounced refresh on filesystem change
//! - Search, delete and move operations over the snapshot

pub mod config;
pub mod error;
pub mod index;
pub mod metadata;
pub mod metrics;
pub mod natural;
pub mod query;
pub mod watcher;

pub use config::{LibraryConfig, MetadataConfig, MoveRule};
pub use error::{LibraryError, LibraryResult};
pub use index::LibraryIndex;
pub use metadata::MetadataCache;
pub use natural::natural_cmp;
pub use query::{LibraryQuery, SearchItem, SearchPage, SortField, SortOrder};
pub use watcher::LibraryWatcher;

//! Library and metadata cache configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Prefix rewrite applied by [`crate::LibraryIndex::move_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRule {
    /// Source prefix, including the trailing `/`
    pub from: String,
    /// Destination prefix, including the trailing `/`
    pub to: String,
}

impl MoveRule {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    /// Destination path for `path`, if this rule applies.
    pub fn apply(&self, path: &str) -> Option<String> {
        path.strip_prefix(self.from.as_str())
            .map(|rest| format!("{}{}", self.to, rest))
    }
}

/// Default review-folder moves.
pub fn default_move_rules() -> Vec<MoveRule> {
    vec![
        MoveRule::new("NVR-blank/", "NVR-upload/"),
        MoveRule::new("NVR-unprocessed/", "NVR-upload/"),
    ]
}

/// Library index configuration.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    /// Root directory of the media library
    pub root: PathBuf,
    /// Prefix rewrites for the move operation
    pub move_rules: Vec<MoveRule>,
    /// Whether to watch the root for changes
    pub watch: bool,
    /// Quiet period before a watched change triggers a refresh
    pub watch_debounce: Duration,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./data"),
            move_rules: default_move_rules(),
            watch: true,
            watch_debounce: Duration::from_millis(2000),
        }
    }
}

impl LibraryConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            root: std::env::var("DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./data")),
            move_rules: default_move_rules(),
            watch: std::env::var("LIBRARY_WATCH")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(true),
            watch_debounce: Duration::from_millis(
                std::env::var("LIBRARY_WATCH_DEBOUNCE_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2000),
            ),
        }
    }

    /// Config rooted at `root` with defaults for everything else.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Self::default()
        }
    }
}

/// Metadata cache configuration.
#[derive(Debug, Clone)]
pub struct MetadataConfig {
    /// Persistence file
    pub file: PathBuf,
    /// Interval of the background flush
    pub flush_interval: Duration,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::from("./data/metadata.json"),
            flush_interval: Duration::from_secs(5),
        }
    }
}

impl MetadataConfig {
    /// Create config from environment variables.
    ///
    /// `METADATA_FILE` is resolved against `root` unless absolute.
    pub fn from_env(root: &Path) -> Self {
        let file = std::env::var("METADATA_FILE").unwrap_or_else(|_| "metadata.json".to_string());
        Self {
            file: root.join(file),
            flush_interval: Duration::from_secs(
                std::env::var("METADATA_FLUSH_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(5),
            ),
        }
    }
}

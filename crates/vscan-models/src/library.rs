//! Library entry and cached metadata models.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A media file known to the library index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct LibraryEntry {
    /// Path relative to the library root, `/` separated. Unique key.
    pub path: String,
    /// File name including extension
    pub name: String,
    /// Size in bytes
    pub size: u64,
    /// Last modification time
    pub modified_at: DateTime<Utc>,
}

impl LibraryEntry {
    /// Directory part of the relative path (empty for files at the root).
    pub fn parent(&self) -> &str {
        self.path.rsplit_once('/').map(|(dir, _)| dir).unwrap_or("")
    }

    /// Whether this entry lives in `dir` or one of its subdirectories.
    pub fn is_within(&self, dir: &str) -> bool {
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            return true;
        }
        self.path == dir
            || (self.path.starts_with(dir) && self.path[dir.len()..].starts_with('/'))
    }
}

/// Derived metadata cached per relative path.
///
/// Persisted as the value of a flat `path -> record` JSON object, so the
/// path itself is not part of the serialized form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MetadataRecord {
    /// Duration in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<f64>,
}

impl MetadataRecord {
    /// Record holding a probed duration.
    pub fn with_duration(duration: f64) -> Self {
        Self {
            duration: Some(duration),
        }
    }
}

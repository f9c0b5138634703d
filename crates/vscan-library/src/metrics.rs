//! Library and metadata cache metrics.

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Media files in the current snapshot.
    pub const LIBRARY_FILES: &str = "vscan_library_files";

    /// Library refresh duration in seconds by outcome.
    pub const LIBRARY_REFRESH_SECONDS: &str = "vscan_library_refresh_seconds";

    /// Duration lookups by result (hit, miss, failed).
    pub const METADATA_LOOKUPS_TOTAL: &str = "vscan_metadata_lookups_total";

    /// Metadata cache flushes by outcome.
    pub const METADATA_FLUSHES_TOTAL: &str = "vscan_metadata_flushes_total";
}

/// Record a finished library refresh.
pub fn record_refresh(success: bool, elapsed_secs: f64, files: Option<usize>) {
    let outcome = if success { "success" } else { "error" };
    histogram!(names::LIBRARY_REFRESH_SECONDS, "outcome" => outcome).record(elapsed_secs);
    if let Some(files) = files {
        gauge!(names::LIBRARY_FILES).set(files as f64);
    }
}

/// Record a duration lookup.
pub fn record_lookup(result: &'static str) {
    counter!(names::METADATA_LOOKUPS_TOTAL, "result" => result).increment(1);
}

/// Record a metadata flush.
pub fn record_flush(success: bool) {
    let outcome = if success { "success" } else { "error" };
    counter!(names::METADATA_FLUSHES_TOTAL, "outcome" => outcome).increment(1);
}

//! Processing job and queue snapshot models.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The job currently streaming from the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProcessingJob {
    /// Relative path of the media file
    pub path: String,
    /// Fraction complete, 0.0 to 1.0
    pub progress: f64,
    /// Human-readable status line
    pub status: String,
}

impl ProcessingJob {
    /// Fresh job record for a path that was just dequeued.
    pub fn starting(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            progress: 0.0,
            status: "Starting...".to_string(),
        }
    }

    /// Apply a worker progress report.
    pub fn update_progress(&mut self, frame: u64, total_frames: u64, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
        self.status = format!("Frame {}/{}", frame, total_frames);
    }
}

/// Snapshot returned by the queue status endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct QueueStatus {
    /// Job being processed, if any
    pub current_job: Option<ProcessingJob>,
    /// Pending paths in dispatch order
    pub queue: Vec<String>,
    /// Whether a drain loop is running
    pub is_processing: bool,
}

/// Result of an enqueue request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct EnqueueOutcome {
    /// Paths appended to the queue
    pub queued: usize,
    /// Paths dropped as duplicates
    pub skipped: usize,
    /// Pending queue length after the call
    pub total: usize,
}

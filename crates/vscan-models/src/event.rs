//! Event-stream message types.
//!
//! Each [`Event`] goes out over SSE as `event: <type>` followed by
//! `data: <json>`. The JSON body is the variant's fields only; the type
//! travels in the SSE event name.

use chrono::Utc;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::worker::Detection;

/// SSE event names understood by the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    /// Library snapshot changed
    Update,
    /// Job dispatched to the worker
    ProcessingStarted,
    /// Worker progress report
    ProcessingProgress,
    /// Worker reported detections
    ProcessingDone,
    /// Worker stream closed cleanly
    VideoProcessed,
    /// Queue ran dry
    ProcessingComplete,
    /// Job failed
    ProcessingError,
    /// Worker telemetry
    GpuStats,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Update => "update",
            EventType::ProcessingStarted => "processing_started",
            EventType::ProcessingProgress => "processing_progress",
            EventType::ProcessingDone => "processing_done",
            EventType::VideoProcessed => "video_processed",
            EventType::ProcessingComplete => "processing_complete",
            EventType::ProcessingError => "processing_error",
            EventType::GpuStats => "gpu_stats",
        }
    }
}

/// Status event fanned out to every connected client.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
#[serde(untagged)]
pub enum Event {
    /// Library index was rebuilt
    LibraryUpdated {
        /// Milliseconds since the Unix epoch
        timestamp: i64,
    },

    /// A job was dispatched
    JobStarted {
        path: String,
        #[serde(rename = "queueLength")]
        queue_length: usize,
    },

    /// Progress for the current job
    JobProgress {
        path: String,
        progress: f64,
        status: String,
    },

    /// Worker finished inference and reported detections
    JobDone {
        path: String,
        detections: Vec<Detection>,
    },

    /// Worker stream for a job closed without error
    VideoProcessed { path: String },

    /// Job ended with an error
    JobError { path: String, error: String },

    /// No pending work remains
    QueueDrained {},

    /// Opaque worker statistics
    Telemetry(serde_json::Value),
}

impl Event {
    /// Create a library updated event stamped with the current time.
    pub fn library_updated() -> Self {
        Event::LibraryUpdated {
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    /// Create a job started event.
    pub fn job_started(path: impl Into<String>, queue_length: usize) -> Self {
        Event::JobStarted {
            path: path.into(),
            queue_length,
        }
    }

    /// Create a job progress event.
    pub fn job_progress(path: impl Into<String>, progress: f64, status: impl Into<String>) -> Self {
        Event::JobProgress {
            path: path.into(),
            progress: progress.clamp(0.0, 1.0),
            status: status.into(),
        }
    }

    /// Create a job done event.
    pub fn job_done(path: impl Into<String>, detections: Vec<Detection>) -> Self {
        Event::JobDone {
            path: path.into(),
            detections,
        }
    }

    /// Create a video processed event.
    pub fn video_processed(path: impl Into<String>) -> Self {
        Event::VideoProcessed { path: path.into() }
    }

    /// Create a job error event.
    pub fn job_error(path: impl Into<String>, error: impl Into<String>) -> Self {
        Event::JobError {
            path: path.into(),
            error: error.into(),
        }
    }

    /// Create a queue drained event.
    pub fn queue_drained() -> Self {
        Event::QueueDrained {}
    }

    /// Get the event type.
    pub fn event_type(&self) -> EventType {
        match self {
            Event::LibraryUpdated { .. } => EventType::Update,
            Event::JobStarted { .. } => EventType::ProcessingStarted,
            Event::JobProgress { .. } => EventType::ProcessingProgress,
            Event::JobDone { .. } => EventType::ProcessingDone,
            Event::VideoProcessed { .. } => EventType::VideoProcessed,
            Event::JobError { .. } => EventType::ProcessingError,
            Event::QueueDrained { .. } => EventType::ProcessingComplete,
            Event::Telemetry(_) => EventType::GpuStats,
        }
    }

    /// SSE event name.
    pub fn name(&self) -> &'static str {
        self.event_type().as_str()
    }

    /// JSON body for the SSE `data:` field.
    pub fn data(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// Path of the job this event refers to, if any.
    pub fn job_path(&self) -> Option<&str> {
        match self {
            Event::JobStarted { path, .. }
            | Event::JobProgress { path, .. }
            | Event::JobDone { path, .. }
            | Event::VideoProcessed { path }
            | Event::JobError { path, .. } => Some(path),
            _ => None,
        }
    }
}

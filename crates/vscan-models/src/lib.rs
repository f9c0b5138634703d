//! Shared data models for the vscan backend.
//!
//! This crate provides Serde-serializable types for:
//! - Library entries and cached media metadata
//! - Processing jobs and queue snapshots
//! - Worker NDJSON records and detections
//! - Event-stream (SSE) messages

pub mod event;
pub mod job;
pub mod library;
pub mod path;
pub mod worker;

// Re-export common types
pub use event::{Event, EventType};
pub use job::{EnqueueOutcome, ProcessingJob, QueueStatus};
pub use library::{LibraryEntry, MetadataRecord};
pub use path::{to_posix_path, validate_relative_path, PathError};
pub use worker::{Detection, WorkerRecord};

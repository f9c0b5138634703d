//! Sequential processing queue.
//!
//! This crate provides:
//! - A deduplicating FIFO of media paths with at most one job in flight
//! - Dispatch to the inference worker and incremental NDJSON consumption
//! - Job state transitions published on the event bus

pub mod error;
pub mod metrics;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::ProcessingQueue;

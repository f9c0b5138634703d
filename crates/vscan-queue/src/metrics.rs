//! Processing queue metrics.

use metrics::{counter, gauge, histogram};

/// Metric name constants for consistency.
pub mod names {
    /// Jobs dispatched to the worker.
    pub const JOBS_STARTED_TOTAL: &str = "vscan_jobs_started_total";

    /// Jobs ended, by outcome (completed, failed, skipped).
    pub const JOBS_FINISHED_TOTAL: &str = "vscan_jobs_finished_total";

    /// Job wall time in seconds, by outcome.
    pub const JOB_DURATION_SECONDS: &str = "vscan_job_duration_seconds";

    /// Paths waiting in the queue.
    pub const QUEUE_PENDING: &str = "vscan_queue_pending";
}

pub fn record_job_started() {
    counter!(names::JOBS_STARTED_TOTAL).increment(1);
}

pub fn record_job_finished(outcome: &'static str, elapsed_secs: f64) {
    counter!(names::JOBS_FINISHED_TOTAL, "outcome" => outcome).increment(1);
    histogram!(names::JOB_DURATION_SECONDS, "outcome" => outcome).record(elapsed_secs);
}

pub fn record_job_skipped() {
    counter!(names::JOBS_FINISHED_TOTAL, "outcome" => "skipped").increment(1);
}

pub fn set_pending(len: usize) {
    gauge!(names::QUEUE_PENDING).set(len as f64);
}

//! Processing queue: pending paths plus at most one in-flight job.
//!
//! A single drain task exists while there is work. It pops the head path,
//! streams the job from the worker and moves on only after the job's
//! terminal event has been published.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use vscan_events::EventBus;
use vscan_ml_client::MlClient;
use vscan_models::{
    validate_relative_path, EnqueueOutcome, Event, ProcessingJob, QueueStatus, WorkerRecord,
};

use crate::error::QueueResult;
use crate::metrics;

/// Status line once the worker acknowledges the job.
const WORKER_STARTED: &str = "Worker started";

#[derive(Debug, Default)]
struct QueueState {
    pending: VecDeque<String>,
    current: Option<ProcessingJob>,
    draining: bool,
}

impl QueueState {
    fn contains(&self, path: &str) -> bool {
        self.current.as_ref().is_some_and(|job| job.path == path)
            || self.pending.iter().any(|p| p == path)
    }
}

/// How a streamed job ended.
enum JobOutcome {
    /// Stream closed without an error record
    Completed,
    /// Worker sent an error record
    WorkerError,
}

struct Inner {
    root: PathBuf,
    worker: Arc<MlClient>,
    events: Arc<EventBus>,
    state: Mutex<QueueState>,
}

/// Sequential job queue in front of the inference worker.
#[derive(Clone)]
pub struct ProcessingQueue {
    inner: Arc<Inner>,
}

impl ProcessingQueue {
    /// Create an idle queue. `root` is the library root job paths are relative to.
    pub fn new(root: impl Into<PathBuf>, worker: Arc<MlClient>, events: Arc<EventBus>) -> Self {
        Self {
            inner: Arc::new(Inner {
                root: root.into(),
                worker,
                events,
                state: Mutex::new(QueueState::default()),
            }),
        }
    }

    /// Append paths that are neither pending nor in flight.
    ///
    /// Starts the drain task if the queue was idle. All paths are validated
    /// before any is queued.
    pub fn enqueue(&self, paths: &[String]) -> QueueResult<EnqueueOutcome> {
        let paths = paths
            .iter()
            .map(|p| validate_relative_path(p))
            .collect::<Result<Vec<_>, _>>()?;

        let mut state = self.inner.state.lock();
        let mut queued = 0;
        let mut skipped = 0;

        for path in paths {
            if state.contains(path) {
                skipped += 1;
                continue;
            }
            state.pending.push_back(path.to_string());
            queued += 1;
        }

        let total = state.pending.len();
        let start_drain = queued > 0 && !state.draining;
        if start_drain {
            state.draining = true;
        }
        drop(state);

        metrics::set_pending(total);
        info!(queued, skipped, total, "Enqueued processing jobs");

        if start_drain {
            let queue = self.clone();
            tokio::spawn(async move { queue.drain().await });
        }

        Ok(EnqueueOutcome {
            queued,
            skipped,
            total,
        })
    }

    /// Drop every pending path. The in-flight job is not affected.
    pub fn clear(&self) -> usize {
        let mut state = self.inner.state.lock();
        let cleared = state.pending.len();
        state.pending.clear();
        drop(state);

        metrics::set_pending(0);
        info!(cleared, "Cleared processing queue");
        cleared
    }

    /// Snapshot of the current job and pending paths.
    pub fn status(&self) -> QueueStatus {
        let state = self.inner.state.lock();
        QueueStatus {
            current_job: state.current.clone(),
            queue: state.pending.iter().cloned().collect(),
            is_processing: state.draining,
        }
    }

    async fn drain(&self) {
        debug!("Queue drain started");

        while let Some(path) = self.next_job() {
            let target = self.inner.root.join(&path);
            if !tokio::fs::try_exists(&target).await.unwrap_or(false) {
                warn!(path = %path, "Queued file no longer exists, skipping");
                metrics::record_job_skipped();
                self.finish_job();
                continue;
            }

            {
                let state = self.inner.state.lock();
                self.inner
                    .events
                    .publish(Event::job_started(path.as_str(), state.pending.len()));
            }
            metrics::record_job_started();
            info!(path = %path, "Processing started");

            let started = Instant::now();
            let outcome = match self.stream_job(&path).await {
                Ok(JobOutcome::Completed) => {
                    self.inner.events.publish(Event::video_processed(path.as_str()));
                    info!(path = %path, "Processing finished");
                    "completed"
                }
                Ok(JobOutcome::WorkerError) => "failed",
                Err(e) => {
                    warn!(path = %path, error = %e, "Processing failed");
                    self.inner
                        .events
                        .publish(Event::job_error(path.as_str(), e.to_string()));
                    "failed"
                }
            };
            metrics::record_job_finished(outcome, started.elapsed().as_secs_f64());

            self.finish_job();
        }

        debug!("Queue drain finished");
    }

    /// Pop the next path and make it current, or go idle.
    fn next_job(&self) -> Option<String> {
        let mut state = self.inner.state.lock();
        match state.pending.pop_front() {
            Some(path) => {
                state.current = Some(ProcessingJob::starting(path.as_str()));
                metrics::set_pending(state.pending.len());
                Some(path)
            }
            None => {
                state.current = None;
                state.draining = false;
                self.inner.events.publish(Event::queue_drained());
                info!("Processing queue drained");
                None
            }
        }
    }

    fn finish_job(&self) {
        self.inner.state.lock().current = None;
    }

    /// Stream one job from the worker, publishing its progress.
    async fn stream_job(&self, path: &str) -> QueueResult<JobOutcome> {
        let mut stream = self.inner.worker.process(path).await?;

        while let Some(record) = stream.next_record().await? {
            match record {
                WorkerRecord::Starting => {
                    if let Some(job) = self.inner.state.lock().current.as_mut() {
                        job.status = WORKER_STARTED.to_string();
                    }
                }
                WorkerRecord::Progress {
                    frame,
                    total_frames,
                    progress,
                } => {
                    let mut state = self.inner.state.lock();
                    if let Some(job) = state.current.as_mut() {
                        job.update_progress(frame, total_frames, progress);
                        self.inner.events.publish(Event::job_progress(
                            path,
                            job.progress,
                            job.status.as_str(),
                        ));
                    }
                }
                WorkerRecord::Complete { detections } => {
                    debug!(path = %path, detections = detections.len(), "Worker reported detections");
                    self.inner.events.publish(Event::job_done(path, detections));
                }
                WorkerRecord::Error { message } => {
                    warn!(path = %path, error = %message, "Worker reported an error");
                    self.inner.events.publish(Event::job_error(path, message));
                    return Ok(JobOutcome::WorkerError);
                }
                WorkerRecord::Unparsed => {
                    debug!(path = %path, "Discarding unparsed worker line");
                }
            }
        }

        Ok(JobOutcome::Completed)
    }
}

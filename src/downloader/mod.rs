//! Queue manager implementation split into focused submodules.
//!
//! The `Downloader` struct and its methods are organized by domain:
//! - [`queue`] - Job construction and enqueueing
//! - [`control`] - Cancellation and error list management
//! - [`queue_processor`] - The sequential run loop
//! - [`download_task`] - Per-job file fetching, archive parts and output

mod control;
mod download_task;
mod queue;
mod queue_processor;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::client::ApiClient;
use crate::config::Config;
use crate::error::Result;
use crate::fetch::{HttpTrackFetcher, TrackFetcher};
use crate::sink::{DirectorySink, OutputSink};
use crate::types::{ErrorRecord, Event, Job, JobId, JobInfo, RunState};

/// Queue, error list and run loop state
///
/// Mutated only by the public enqueue/cancel/dismiss operations and by the run
/// loop, always under one lock and never across an await point.
#[derive(Debug, Default)]
pub(crate) struct QueueState {
    /// Pending jobs in FIFO order; the head is the running job while the loop runs
    pub(crate) jobs: VecDeque<Arc<Job>>,
    /// Fetch failures in insertion order
    pub(crate) errors: Vec<ErrorRecord>,
    /// Whether a run loop task is alive
    pub(crate) run_state: RunState,
    /// Last assigned job id
    pub(crate) last_job_id: u64,
    /// Last assigned error id
    pub(crate) last_error_id: u64,
}

/// Main downloader instance (cloneable - all fields are Arc-wrapped)
#[derive(Clone)]
pub struct Downloader {
    /// Queue, errors and run state
    pub(crate) state: Arc<Mutex<QueueState>>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Signalled whenever the run loop goes idle
    pub(crate) idle: Arc<tokio::sync::Notify>,
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// Content API client for metadata lookups
    pub(crate) client: ApiClient,
    /// Track payload source
    pub(crate) fetcher: Arc<dyn TrackFetcher>,
    /// Destination of finished files and archive parts
    pub(crate) sink: Arc<dyn OutputSink>,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("state", &self.state)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Downloader {
    /// Create a downloader fetching from the content API and writing into
    /// the configured output directory
    ///
    /// Validates the configuration and builds the HTTP client. The output
    /// directory is created when the first file is saved.
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let client = ApiClient::new(&config.api)?;
        let fetcher: Arc<dyn TrackFetcher> = Arc::new(HttpTrackFetcher::new(client.clone()));
        let sink: Arc<dyn OutputSink> = Arc::new(DirectorySink::new(
            config.download.output_dir.clone(),
            config.download.file_collision,
        ));
        Ok(Self::assemble(config, client, fetcher, sink))
    }

    /// Create a downloader with custom fetch and output collaborators
    pub fn with_components(
        config: Config,
        fetcher: Arc<dyn TrackFetcher>,
        sink: Arc<dyn OutputSink>,
    ) -> Result<Self> {
        config.validate()?;
        let client = ApiClient::new(&config.api)?;
        Ok(Self::assemble(config, client, fetcher, sink))
    }

    fn assemble(
        config: Config,
        client: ApiClient,
        fetcher: Arc<dyn TrackFetcher>,
        sink: Arc<dyn OutputSink>,
    ) -> Self {
        let (event_tx, _rx) = tokio::sync::broadcast::channel(config.event_channel_capacity);
        Self {
            state: Arc::new(Mutex::new(QueueState::default())),
            event_tx,
            idle: Arc::new(tokio::sync::Notify::new()),
            config: Arc::new(config),
            client,
            fetcher,
            sink,
        }
    }

    /// Subscribe to job events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all events independently.
    /// Events are buffered, but if a subscriber falls behind by more than the configured
    /// capacity, it will receive a `RecvError::Lagged` error.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Content API client, for resolving ids to enqueue requests
    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    /// Snapshot of the queue, running job first
    pub fn queue(&self) -> Vec<JobInfo> {
        self.lock_state().jobs.iter().map(|job| job.info()).collect()
    }

    /// Snapshot of one queued job
    pub fn job(&self, id: JobId) -> Option<JobInfo> {
        self.find_job(id).map(|job| job.info())
    }

    /// Watch the progress of a queued job
    pub fn progress(&self, id: JobId) -> Option<tokio::sync::watch::Receiver<f64>> {
        self.find_job(id).map(|job| job.watch_progress())
    }

    /// Snapshot of the error list, oldest first
    pub fn errors(&self) -> Vec<ErrorRecord> {
        self.lock_state().errors.clone()
    }

    /// Whether the run loop is currently draining the queue
    pub fn state(&self) -> RunState {
        self.lock_state().run_state
    }

    /// Wait until the queue is drained and the run loop has stopped
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            {
                let state = self.lock_state();
                if state.run_state == RunState::Idle && state.jobs.is_empty() {
                    return;
                }
            }
            notified.await;
        }
    }

    fn find_job(&self, id: JobId) -> Option<Arc<Job>> {
        self.lock_state()
            .jobs
            .iter()
            .find(|job| job.id() == id)
            .cloned()
    }

    /// Lock the shared state
    ///
    /// A panic while holding the lock cannot leave the queue half-updated
    /// (every critical section is a single push/remove), so poisoning is ignored.
    pub(crate) fn lock_state(&self) -> MutexGuard<'_, QueueState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Emit an event to all subscribers
    ///
    /// If there are no active subscribers, the event is silently dropped.
    pub(crate) fn emit_event(&self, event: Event) {
        // send() returns Err if there are no receivers, which is fine - we just drop the event
        self.event_tx.send(event).ok();
    }
}

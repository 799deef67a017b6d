//! Job task context -- shared state and reporting helpers for one running job.

use std::sync::Arc;

use crate::config::CoverConfig;
use crate::error::FetchError;
use crate::fetch::{FetchRequest, TrackFetcher};
use crate::sink::OutputSink;
use crate::types::{ErrorRecord, Event, Job, JobFile, JobId};

use super::super::Downloader;

/// Resolution of progress events; the watch channel keeps every value
const PROGRESS_EVENT_STEPS: f64 = 1000.0;

/// Shared context for a single job, reducing parameter passing between helpers.
pub(crate) struct JobTaskContext {
    pub(crate) job: Arc<Job>,
    pub(crate) fetcher: Arc<dyn TrackFetcher>,
    pub(crate) sink: Arc<dyn OutputSink>,
    pub(crate) cover: CoverConfig,
    pub(crate) part_size_bytes: u64,
    pub(crate) downloader: Downloader,
}

impl JobTaskContext {
    pub(crate) fn new(downloader: &Downloader, job: Arc<Job>) -> Self {
        Self {
            job,
            fetcher: Arc::clone(&downloader.fetcher),
            sink: Arc::clone(&downloader.sink),
            cover: downloader.config.download.cover.clone(),
            part_size_bytes: downloader.config.download.part_size_bytes,
            downloader: downloader.clone(),
        }
    }

    pub(super) fn id(&self) -> JobId {
        self.job.id()
    }

    pub(super) fn emit(&self, event: Event) {
        self.downloader.emit_event(event);
    }

    pub(super) fn fetch_request(&self, file: &JobFile) -> FetchRequest {
        FetchRequest {
            track_id: file.track.deezer.id.clone(),
            format: file.format,
            cover: self.cover.clone(),
        }
    }

    /// Raise the job's progress and emit an event when it moved visibly
    pub(super) fn report_progress(&self, value: f64) {
        let before = self.job.progress();
        if !self.job.advance_progress(value) {
            return;
        }
        let after = self.job.progress();
        if (before * PROGRESS_EVENT_STEPS).floor() != (after * PROGRESS_EVENT_STEPS).floor() {
            self.emit(Event::Progress {
                id: self.id(),
                progress: after,
            });
        }
    }

    /// Record a failed fetch in the error list; the job carries on
    pub(super) fn record_failure(&self, file: &JobFile, error: &FetchError) -> ErrorRecord {
        let record = self.downloader.record_error(&self.job, file);
        tracing::warn!(
            job_id = self.id().0,
            error_id = record.id.0,
            track_id = %file.track.deezer.id,
            filename = %record.track_filename,
            error = %error,
            "Track download failed, continuing with the rest of the job"
        );
        self.emit(Event::FileFailed {
            id: self.id(),
            record: record.clone(),
            error: error.to_string(),
        });
        record
    }

    /// Hand a finished file or archive part to the sink
    ///
    /// Nothing is saved once the job is cancelled. Returns whether the save
    /// succeeded; failures are logged and reported, never propagated.
    pub(super) async fn save(&self, filename: String, part: Option<u32>, data: Vec<u8>) -> bool {
        if self.job.is_cancelled() {
            return false;
        }

        let size_bytes = data.len() as u64;
        match self.sink.save(&filename, data).await {
            Ok(path) => {
                tracing::info!(
                    job_id = self.id().0,
                    filename = %filename,
                    path = %path.display(),
                    size_bytes,
                    "Output saved"
                );
                self.emit(Event::Saved {
                    id: self.id(),
                    filename,
                    part,
                    size_bytes,
                });
                true
            }
            Err(e) => {
                self.save_failed(filename, &e);
                false
            }
        }
    }

    pub(super) fn save_failed(&self, filename: String, error: &dyn std::error::Error) {
        tracing::error!(
            job_id = self.id().0,
            filename = %filename,
            error = %error,
            "Failed to save output"
        );
        self.emit(Event::SaveFailed {
            id: self.id(),
            filename,
            error: error.to_string(),
        });
    }
}

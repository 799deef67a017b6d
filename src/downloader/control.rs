//! Job cancellation and error list management.

use std::sync::Arc;
use tracing::{debug, info};

use crate::naming::track_url;
use crate::types::{ErrorId, ErrorRecord, Event, Job, JobFile, JobId};

use super::Downloader;

impl Downloader {
    /// Cancel a queued or running job
    ///
    /// The job leaves the queue immediately. A pending job is never started; a
    /// running job stops at its next cancellation point, its in-flight fetch is
    /// aborted and nothing it accumulated is saved.
    ///
    /// Returns `false` when no job with this id is queued.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use deezer_dl::*;
    /// # fn example(downloader: Downloader, id: JobId) {
    /// if !downloader.cancel_download(id) {
    ///     println!("job {id} already finished");
    /// }
    /// # }
    /// ```
    pub fn cancel_download(&self, id: JobId) -> bool {
        let Some(job) = self.remove_job(id) else {
            debug!(job_id = id.0, "cancel requested for unknown job");
            return false;
        };

        job.cancel_token.cancel();
        info!(job_id = id.0, display_filename = %job.display_filename(), "Job cancelled");
        self.emit_event(Event::Removed { id });
        true
    }

    /// Remove one record from the error list
    ///
    /// Returns `false` when no record with this id exists.
    pub fn dismiss_error(&self, id: ErrorId) -> bool {
        let removed = {
            let mut state = self.lock_state();
            match state.errors.iter().position(|record| record.id == id) {
                Some(index) => {
                    state.errors.remove(index);
                    true
                }
                None => false,
            }
        };

        if removed {
            self.emit_event(Event::ErrorDismissed { id });
        }
        removed
    }

    /// Append a record for a failed track fetch
    pub(crate) fn record_error(&self, job: &Job, file: &JobFile) -> ErrorRecord {
        let mut state = self.lock_state();
        state.last_error_id += 1;
        let record = ErrorRecord {
            id: ErrorId(state.last_error_id),
            source_url: job.source_url().to_string(),
            track_url: track_url(&file.track.deezer.id),
            track_filename: file.filename(),
            display_filename: job.display_filename().to_string(),
        };
        state.errors.push(record.clone());
        record
    }

    /// Take a job out of the queue, wherever it sits
    pub(crate) fn remove_job(&self, id: JobId) -> Option<Arc<Job>> {
        let mut state = self.lock_state();
        let index = state.jobs.iter().position(|job| job.id() == id)?;
        state.jobs.remove(index)
    }
}

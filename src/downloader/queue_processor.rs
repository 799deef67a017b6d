//! Run loop -- drains the queue one job at a time.

use super::Downloader;
use super::download_task::{JobOutcome, JobTaskContext, run_job};
use crate::types::{Event, RunState};

impl Downloader {
    /// Start the run loop task
    ///
    /// Called by the enqueue operations after they moved the state from Idle
    /// to Running, so at most one loop is ever alive.
    ///
    /// The loop repeatedly runs the job at the head of the queue and removes
    /// it afterwards. When it finds the queue empty it switches back to Idle
    /// under the same lock, emits [`Event::Idle`] and exits.
    pub(crate) fn spawn_run_loop(&self) -> tokio::task::JoinHandle<()> {
        let downloader = self.clone();
        tokio::spawn(async move { downloader.run_queue().await })
    }

    async fn run_queue(&self) {
        tracing::debug!("Run loop started");

        loop {
            let next = {
                let mut state = self.lock_state();
                let head = state.jobs.front().cloned();
                if head.is_none() {
                    state.run_state = RunState::Idle;
                }
                head
            };
            let Some(job) = next else {
                break;
            };

            let id = job.id();
            let ctx = JobTaskContext::new(self, job);

            // Jobs run in their own task so a panic only loses that job
            match tokio::spawn(run_job(ctx)).await {
                Ok(JobOutcome::Completed {
                    outputs,
                    failed_files,
                }) => {
                    tracing::debug!(job_id = id.0, outputs, failed_files, "Job left the run loop");
                }
                Ok(JobOutcome::Cancelled) => {
                    tracing::debug!(job_id = id.0, "Cancelled job left the run loop");
                }
                Err(e) => {
                    tracing::error!(job_id = id.0, error = %e, "Job task failed");
                }
            }

            self.remove_job(id);
        }

        tracing::info!("Queue drained, run loop idle");
        self.emit_event(Event::Idle);
        self.idle.notify_waiters();
    }
}

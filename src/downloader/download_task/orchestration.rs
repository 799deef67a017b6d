//! Job orchestration -- the per-file loop of a single job.

use std::sync::Arc;

use crate::types::{Event, JobKind};

use super::context::JobTaskContext;
use super::finalization::{ArchiveOutput, report_cancelled, report_finished};

/// Ceiling for a file's share of progress while its bytes are still arriving
///
/// A file counts as complete only once its fetch returns.
const MAX_IN_FLIGHT_FRACTION: f64 = 0.999;

/// How a job left the run loop
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum JobOutcome {
    /// Every file was attempted
    Completed {
        /// Files or archive parts saved
        outputs: usize,
        /// Tracks that failed to fetch
        failed_files: usize,
    },
    /// The job was cancelled; nothing more was saved
    Cancelled,
}

/// Run one job to completion or cancellation.
///
/// Files are fetched strictly one after another. A failed fetch becomes an
/// error record and the loop moves on. Archive jobs accumulate payloads and
/// split off a numbered part whenever the pending part exceeds the part size,
/// except after the last file; the rest is written when the loop ends.
pub(crate) async fn run_job(ctx: JobTaskContext) -> JobOutcome {
    let job = Arc::clone(&ctx.job);
    let total_files = job.files().len();

    tracing::info!(
        job_id = ctx.id().0,
        files = total_files,
        display_filename = %job.display_filename(),
        "Job started"
    );
    ctx.emit(Event::Started { id: ctx.id() });

    let mut archive = match job.kind() {
        JobKind::SingleFile => None,
        JobKind::Archive { basename } => Some(ArchiveOutput::new(basename.clone())),
    };
    let mut outputs = 0;
    let mut failed_files = 0;

    for (index, file) in job.files().iter().enumerate() {
        if job.is_cancelled() {
            report_cancelled(&ctx);
            return JobOutcome::Cancelled;
        }

        let request = ctx.fetch_request(file);
        let expected_size = file.track.format_size(file.format);
        let on_progress = |loaded: u64, total: Option<u64>| {
            let fraction = match total.or(expected_size) {
                Some(total) if total > 0 => {
                    (loaded as f64 / total as f64).min(MAX_IN_FLIGHT_FRACTION)
                }
                _ => 0.0,
            };
            ctx.report_progress((index as f64 + fraction) / total_files as f64);
        };

        match ctx
            .fetcher
            .fetch(&request, &job.cancel_token, &on_progress)
            .await
        {
            Ok(data) => match archive.as_mut() {
                None => {
                    if ctx.save(file.filename(), None, data).await {
                        outputs += 1;
                    }
                }
                Some(archive) => {
                    let entry = archive.add(file, data);
                    tracing::debug!(job_id = ctx.id().0, entry = %entry, "Track added to archive");

                    let is_last = index + 1 == total_files;
                    if !is_last
                        && archive.should_flush(ctx.part_size_bytes)
                        && archive.flush(&ctx).await
                    {
                        outputs += 1;
                    }
                }
            },
            Err(e) if e.is_cancelled() || job.is_cancelled() => {
                report_cancelled(&ctx);
                return JobOutcome::Cancelled;
            }
            Err(e) => {
                ctx.record_failure(file, &e);
                failed_files += 1;
            }
        }

        ctx.report_progress((index + 1) as f64 / total_files as f64);
    }

    if let Some(archive) = archive
        && archive.finish(&ctx).await
    {
        outputs += 1;
    }

    if job.is_cancelled() {
        report_cancelled(&ctx);
        return JobOutcome::Cancelled;
    }

    report_finished(&ctx, outputs, failed_files);
    JobOutcome::Completed {
        outputs,
        failed_files,
    }
}

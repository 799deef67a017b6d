//! Archive part output and job outcome reporting.

use crate::archive::{ArchiveAccumulator, pack_zip};
use crate::naming::archive_filename;
use crate::types::{Event, JobFile};

use super::context::JobTaskContext;

/// Archive output of one job: the pending part and how many parts were split off
pub(super) struct ArchiveOutput {
    basename: String,
    accumulator: ArchiveAccumulator,
    last_part: u32,
}

impl ArchiveOutput {
    pub(super) fn new(basename: String) -> Self {
        Self {
            basename,
            accumulator: ArchiveAccumulator::new(),
            last_part: 0,
        }
    }

    /// Add a fetched track to the pending part, returning its entry name
    pub(super) fn add(&mut self, file: &JobFile, data: Vec<u8>) -> String {
        self.accumulator
            .insert_unique(&file.basename, file.format.extension(), data)
    }

    /// Whether the pending part has outgrown `part_size_bytes`
    pub(super) fn should_flush(&self, part_size_bytes: u64) -> bool {
        self.accumulator.total_bytes() > part_size_bytes
    }

    /// Split off the pending part as the next numbered part
    pub(super) async fn flush(&mut self, ctx: &JobTaskContext) -> bool {
        self.last_part += 1;
        let part = self.last_part;
        self.write_part(ctx, part).await
    }

    /// Write whatever is left after the last file
    ///
    /// An archive that was never split is saved without a part number
    /// (`Name.zip`); otherwise the rest becomes the next numbered part. Nothing
    /// is written when the pending part is empty.
    pub(super) async fn finish(mut self, ctx: &JobTaskContext) -> bool {
        if self.accumulator.is_empty() {
            tracing::debug!(
                job_id = ctx.id().0,
                parts = self.last_part,
                "No pending archive entries, skipping final part"
            );
            return false;
        }

        let part = if self.last_part == 0 {
            0
        } else {
            self.last_part + 1
        };
        self.write_part(ctx, part).await
    }

    async fn write_part(&mut self, ctx: &JobTaskContext, part: u32) -> bool {
        let filename = archive_filename(&self.basename, part);
        let entries = self.accumulator.take();
        if ctx.job.is_cancelled() {
            return false;
        }

        tracing::debug!(
            job_id = ctx.id().0,
            filename = %filename,
            entries = entries.len(),
            "Packing archive part"
        );
        match pack_zip(entries).await {
            Ok(buffer) => ctx.save(filename, Some(part), buffer).await,
            Err(e) => {
                ctx.save_failed(filename, &e);
                false
            }
        }
    }
}

/// Report a job that ran to the end
pub(super) fn report_finished(ctx: &JobTaskContext, outputs: usize, failed_files: usize) {
    ctx.report_progress(1.0);
    if failed_files > 0 {
        tracing::warn!(
            job_id = ctx.id().0,
            outputs,
            failed_files,
            total_files = ctx.job.files().len(),
            "Job finished with some failures"
        );
    } else {
        tracing::info!(job_id = ctx.id().0, outputs, "Job finished");
    }
    ctx.emit(Event::Finished {
        id: ctx.id(),
        outputs,
        failed_files,
    });
}

/// Report a job that stopped on cancellation; its output is discarded
pub(super) fn report_cancelled(ctx: &JobTaskContext) {
    tracing::info!(job_id = ctx.id().0, "Job stopped on cancellation, output discarded");
    ctx.emit(Event::Cancelled { id: ctx.id() });
}

//! Job execution -- fetching a job's files and producing its outputs.
//!
//! Split into focused submodules:
//! - [`context`] - Shared per-job state, progress, error and save reporting
//! - [`orchestration`] - The per-file loop for a single job
//! - [`finalization`] - Archive parts and the final job outcome

mod context;
mod finalization;
mod orchestration;

pub(crate) use context::JobTaskContext;
pub(crate) use orchestration::{JobOutcome, run_job};

//! # haven-jobs
//!
//! Generic driver for long-running backend operations (model download,
//! local training, privacy-preserving sync).
//!
//! Every operation follows the same lifecycle: submit a start request, then
//! poll the returned job id sequentially until the backend reports a
//! terminal state, forwarding progress to a caller-supplied sink as it
//! arrives.  When the backend cannot be reached at submission time the
//! controller switches to a deterministic local simulation instead of
//! failing, so the application stays fully exercisable offline.  A
//! connectivity loss *after* a successful submission is a terminal failure:
//! once a job exists server-side, faking its completion would claim state
//! the world does not have.

pub mod controller;
pub mod registry;

mod error;

pub use controller::{run_job, CancelToken, JobKind, JobOutcome, JobSpec, ProgressSink, SIM_TICK};
pub use error::JobError;
pub use registry::{ActiveJob, JobRegistry};

use std::time::Duration;

use thiserror::Error;

use crate::controller::JobKind;

/// Terminal failures of a job run.
///
/// A connectivity failure at submission time never produces one of these;
/// it is absorbed into simulated mode instead.
#[derive(Error, Debug)]
pub enum JobError {
    /// The backend became unreachable while polling an already-submitted
    /// job.
    #[error("Backend unreachable: {0}")]
    Connectivity(String),

    /// The backend rejected the request or reported the job failed.  The
    /// message is surfaced to the user verbatim.
    #[error("{0}")]
    Backend(String),

    /// Another job of the same kind is still running.
    #[error("A {0} job is already in progress")]
    AlreadyInProgress(JobKind),

    /// The caller cancelled the job between ticks.
    #[error("Job cancelled")]
    Cancelled,

    /// The per-job deadline elapsed before the job reached a terminal
    /// state.
    #[error("Job timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, JobError>;

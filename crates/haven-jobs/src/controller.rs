//! The job state machine:
//! `Submitting -> {RemotePolling | SimulatedPolling} -> {Completed | Failed}`.
//!
//! One generic driver, parameterised over a [`JobSpec`] that supplies the
//! start request, the poll request and the per-kind timing constants.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::mpsc;
use tokio::time::Instant;

use haven_net::{BackendClient, JobProgress, JobStatus, NetError};

use crate::error::JobError;

/// Tick length of the local simulation.
pub const SIM_TICK: Duration = Duration::from_millis(500);

/// The three kinds of long-running backend operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobKind {
    Download,
    Train,
    Sync,
}

impl JobKind {
    /// Delay between two consecutive remote polls.  Training polls at half
    /// the rate because a training run is expected to take much longer.
    pub fn poll_interval(&self) -> Duration {
        match self {
            JobKind::Download | JobKind::Sync => Duration::from_millis(1000),
            JobKind::Train => Duration::from_millis(2000),
        }
    }

    /// Progress added per simulation tick.
    pub fn sim_step(&self) -> u8 {
        match self {
            JobKind::Download => 5,
            JobKind::Train => 4,
            JobKind::Sync => 10,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            JobKind::Download => "download",
            JobKind::Train => "train",
            JobKind::Sync => "sync",
        }
    }
}

impl std::fmt::Display for JobKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a finished job leaves the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Final progress value forwarded to the sink.
    pub progress: u8,
    /// Download jobs only: where the backend placed the model.
    pub model_path: Option<String>,
    /// Whether the run was a local simulation rather than a real backend
    /// job.  Callers must treat simulated side effects as placeholders.
    pub simulated: bool,
}

/// Progress sink.  Sends never block; a dropped receiver does not stop the
/// job, the caller has merely stopped listening.
pub type ProgressSink = mpsc::UnboundedSender<u8>;

/// Cooperative cancellation token, checked between ticks.
///
/// Cancellation does not reach the backend (the remote job runs on); it
/// only stops this client from driving and reporting it.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Capability record for one operation kind: how to start it and how to
/// poll it.  The controller owns everything else.
pub trait JobSpec: Send + Sync {
    fn kind(&self) -> JobKind;

    /// Issue the start request.  Returns the server-issued job id.
    fn submit<'a>(&'a self, client: &'a BackendClient)
        -> BoxFuture<'a, Result<String, NetError>>;

    /// Issue one progress request for the job id.
    fn poll<'a>(
        &'a self,
        client: &'a BackendClient,
        job_id: &'a str,
    ) -> BoxFuture<'a, Result<JobProgress, NetError>>;
}

/// Drive one job to a terminal state.
///
/// Mode selection happens exactly once, at submission:
/// - submission succeeds -> remote polling against the returned job id;
/// - submission fails with a connectivity error -> local simulation (the
///   caller is never told submission failed);
/// - submission is rejected by a reachable backend -> [`JobError::Backend`].
///
/// The optional `deadline` bounds the whole run; `cancel` is checked
/// between ticks in both modes.
pub async fn run_job(
    client: &BackendClient,
    spec: &dyn JobSpec,
    sink: &ProgressSink,
    cancel: &CancelToken,
    deadline: Option<Duration>,
) -> Result<JobOutcome, JobError> {
    let kind = spec.kind();
    let started = Instant::now();

    if cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }

    match spec.submit(client).await {
        Ok(job_id) => {
            tracing::info!(%kind, %job_id, "job submitted, polling");
            poll_remote(client, spec, &job_id, sink, cancel, deadline, started).await
        }
        Err(e) if e.is_connectivity() => {
            tracing::warn!(%kind, error = %e, "backend unreachable, running simulated job");
            run_simulated(kind, sink, cancel, deadline, started).await
        }
        Err(NetError::Backend { message, .. }) => {
            tracing::warn!(%kind, %message, "backend rejected job submission");
            Err(JobError::Backend(message))
        }
        Err(other) => {
            // A garbled response means the service was reachable; this is
            // an application failure, not grounds for simulation.
            Err(JobError::Backend(other.to_string()))
        }
    }
}

async fn poll_remote(
    client: &BackendClient,
    spec: &dyn JobSpec,
    job_id: &str,
    sink: &ProgressSink,
    cancel: &CancelToken,
    deadline: Option<Duration>,
    started: Instant,
) -> Result<JobOutcome, JobError> {
    let kind = spec.kind();

    loop {
        check_limits(cancel, deadline, started)?;

        // Sequential polling: the next request is only issued after this
        // one resolved.  A transport failure here is terminal; the job
        // exists server-side and must not be faked to completion.
        let progress = spec.poll(client, job_id).await.map_err(|e| match e {
            NetError::Connectivity(msg) => JobError::Connectivity(msg),
            NetError::Backend { message, .. } => JobError::Backend(message),
            NetError::Decode(msg) => JobError::Backend(msg),
        })?;

        // Forward verbatim, no clamping or interpolation.
        let _ = sink.send(progress.progress);

        match progress.status {
            JobStatus::Completed => {
                tracing::info!(%kind, %job_id, "job completed");
                return Ok(JobOutcome {
                    progress: progress.progress,
                    model_path: progress.model_path,
                    simulated: false,
                });
            }
            JobStatus::Failed => {
                let message = progress
                    .error
                    .unwrap_or_else(|| format!("{kind} job failed"));
                tracing::warn!(%kind, %job_id, %message, "job failed");
                return Err(JobError::Backend(message));
            }
            JobStatus::Pending | JobStatus::Running => {
                tokio::time::sleep(kind.poll_interval()).await;
            }
        }
    }
}

/// Deterministic local progression.  Performs no data movement at all; any
/// side effect the caller attaches to the outcome must be a clearly-marked
/// placeholder.
async fn run_simulated(
    kind: JobKind,
    sink: &ProgressSink,
    cancel: &CancelToken,
    deadline: Option<Duration>,
    started: Instant,
) -> Result<JobOutcome, JobError> {
    let step = kind.sim_step();
    let mut progress: u8 = 0;

    loop {
        check_limits(cancel, deadline, started)?;

        tokio::time::sleep(SIM_TICK).await;
        progress = progress.saturating_add(step).min(100);
        let _ = sink.send(progress);

        if progress >= 100 {
            tracing::info!(%kind, "simulated job completed");
            return Ok(JobOutcome {
                progress: 100,
                model_path: None,
                simulated: true,
            });
        }
    }
}

fn check_limits(
    cancel: &CancelToken,
    deadline: Option<Duration>,
    started: Instant,
) -> Result<(), JobError> {
    if cancel.is_cancelled() {
        return Err(JobError::Cancelled);
    }
    if let Some(limit) = deadline {
        if started.elapsed() >= limit {
            return Err(JobError::Timeout(limit));
        }
    }
    Ok(())
}

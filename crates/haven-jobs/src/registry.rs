//! At-most-one-job-per-kind guard.
//!
//! Two polling loops of the same kind feeding the same progress sink would
//! interleave meaninglessly, so starting a second job while one is in
//! flight is rejected up front.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use crate::controller::JobKind;
use crate::error::JobError;

/// Tracks which job kinds are currently in flight.
#[derive(Debug, Clone, Default)]
pub struct JobRegistry {
    active: Arc<Mutex<HashSet<JobKind>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim a slot for `kind`.  The returned guard releases the slot on
    /// drop, whichever way the job ends.
    pub fn begin(&self, kind: JobKind) -> Result<ActiveJob, JobError> {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if !active.insert(kind) {
            return Err(JobError::AlreadyInProgress(kind));
        }
        Ok(ActiveJob {
            kind,
            active: self.active.clone(),
        })
    }

    /// Whether a job of `kind` is currently in flight.
    pub fn is_active(&self, kind: JobKind) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&kind)
    }
}

/// RAII slot claim for one job kind.
#[derive(Debug)]
pub struct ActiveJob {
    kind: JobKind,
    active: Arc<Mutex<HashSet<JobKind>>>,
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.kind);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_job_of_same_kind_is_rejected() {
        let registry = JobRegistry::new();

        let guard = registry.begin(JobKind::Download).unwrap();
        assert!(registry.is_active(JobKind::Download));

        let err = registry.begin(JobKind::Download).unwrap_err();
        assert!(matches!(err, JobError::AlreadyInProgress(JobKind::Download)));

        drop(guard);
        assert!(!registry.is_active(JobKind::Download));
        registry.begin(JobKind::Download).unwrap();
    }

    #[test]
    fn different_kinds_run_concurrently() {
        let registry = JobRegistry::new();

        let _dl = registry.begin(JobKind::Download).unwrap();
        let _tr = registry.begin(JobKind::Train).unwrap();
        let _sy = registry.begin(JobKind::Sync).unwrap();

        assert!(registry.is_active(JobKind::Download));
        assert!(registry.is_active(JobKind::Train));
        assert!(registry.is_active(JobKind::Sync));
    }
}

//! Application context shared by every command.
//!
//! Constructed exactly once at startup and passed down explicitly; there
//! are no process-wide singletons.  The store handle lives behind a
//! `std::sync::Mutex` (rusqlite connections are not `Sync`); lock sections
//! are short and never held across an `.await`.

use std::sync::{Mutex, MutexGuard, PoisonError, RwLock};

use haven_jobs::JobRegistry;
use haven_net::{BackendClient, ConnectivityHandle, ModelInfo, ModelStatus};
use haven_store::Database;

/// Transient in-memory copy of the backend's last known model state.
/// Purely an offline-read fallback; the durable truth is the store.
#[derive(Debug, Default, Clone)]
pub struct ModelCache {
    pub status: Option<ModelStatus>,
    pub info: Option<ModelInfo>,
}

/// Central application state.
pub struct AppContext {
    db: Mutex<Database>,
    backend: BackendClient,
    jobs: JobRegistry,
    connectivity: Option<ConnectivityHandle>,
    model_cache: RwLock<ModelCache>,
}

impl AppContext {
    /// Build a context around an opened database and a backend client.
    pub fn new(db: Database, backend: BackendClient) -> Self {
        Self {
            db: Mutex::new(db),
            backend,
            jobs: JobRegistry::new(),
            connectivity: None,
            model_cache: RwLock::new(ModelCache::default()),
        }
    }

    /// Attach a running connectivity monitor.  Without one, sync is always
    /// allowed to try (and will fall back on its own error handling).
    pub fn with_connectivity(mut self, handle: ConnectivityHandle) -> Self {
        self.connectivity = Some(handle);
        self
    }

    /// Locked access to the store handle.  A poisoned lock is recovered:
    /// the database itself stays consistent per-statement.
    pub fn db(&self) -> MutexGuard<'_, Database> {
        self.db.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn backend(&self) -> &BackendClient {
        &self.backend
    }

    pub fn jobs(&self) -> &JobRegistry {
        &self.jobs
    }

    pub fn connectivity(&self) -> Option<&ConnectivityHandle> {
        self.connectivity.as_ref()
    }

    /// Latest cached model status/info snapshot.
    pub fn model_cache(&self) -> ModelCache {
        self.model_cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn update_model_cache(&self, f: impl FnOnce(&mut ModelCache)) {
        let mut cache = self
            .model_cache
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        f(&mut cache);
    }
}

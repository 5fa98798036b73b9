//! Connectivity monitor.
//!
//! Polls an external reachability probe on a fixed interval and publishes
//! the latest boolean through a `watch` channel.  The monitor only gates
//! user-facing actions (the sync button); the job layer detects
//! connectivity loss independently at submission time.

use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use tokio::sync::watch;

/// How often the probe is consulted.
pub const PROBE_INTERVAL: Duration = Duration::from_secs(30);

/// External reachability probe.
///
/// The host shell normally supplies this (it knows about the OS network
/// stack); [`HttpProbe`] is the built-in fallback.
pub trait ConnectivityProbe: Send + Sync + 'static {
    /// Returns whether the outside world currently looks reachable.
    fn check(&self) -> BoxFuture<'static, bool>;
}

/// Probe that issues a GET against a fixed URL and reports reachable when
/// the request completes at the transport level, whatever the status code.
pub struct HttpProbe {
    http: reqwest::Client,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl ConnectivityProbe for HttpProbe {
    fn check(&self) -> BoxFuture<'static, bool> {
        let http = self.http.clone();
        let url = self.url.clone();
        Box::pin(async move { http.get(&url).send().await.is_ok() })
    }
}

/// Read side of the monitor.  Cheap to clone and hand out.
#[derive(Debug, Clone)]
pub struct ConnectivityHandle {
    rx: watch::Receiver<bool>,
}

impl ConnectivityHandle {
    /// Latest probe result.  `false` until the first probe has completed.
    pub fn is_online(&self) -> bool {
        *self.rx.borrow()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.rx.clone()
    }
}

/// Spawn the background monitor task.  The task probes immediately, then on
/// every `interval` tick, and exits once all handles are dropped.
pub fn spawn_monitor(probe: Arc<dyn ConnectivityProbe>, interval: Duration) -> ConnectivityHandle {
    let (tx, rx) = watch::channel(false);

    tokio::spawn(async move {
        loop {
            let online = probe.check().await;
            if tx.send(online).is_err() {
                // All handles dropped; nobody is listening any more.
                break;
            }
            tracing::debug!(online, "connectivity probe");
            tokio::time::sleep(interval).await;
        }
    });

    ConnectivityHandle { rx }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StubProbe {
        online: Arc<AtomicBool>,
    }

    impl ConnectivityProbe for StubProbe {
        fn check(&self) -> BoxFuture<'static, bool> {
            let online = self.online.clone();
            Box::pin(async move { online.load(Ordering::SeqCst) })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn monitor_tracks_probe_state() {
        let online = Arc::new(AtomicBool::new(true));
        let handle = spawn_monitor(
            Arc::new(StubProbe {
                online: online.clone(),
            }),
            Duration::from_secs(30),
        );

        let mut rx = handle.subscribe();
        rx.changed().await.unwrap();
        assert!(handle.is_online());

        online.store(false, Ordering::SeqCst);
        // Next tick is 30 s out; the paused clock fast-forwards.
        rx.changed().await.unwrap();
        assert!(!handle.is_online());
    }

    #[tokio::test]
    async fn offline_until_first_probe() {
        let handle = spawn_monitor(
            Arc::new(StubProbe {
                online: Arc::new(AtomicBool::new(true)),
            }),
            Duration::from_secs(30),
        );
        // Before the first probe lands, the state is pessimistic.
        // (This read races the spawned task, so only assert it does not
        // panic; the tracked-state test covers the transition.)
        let _ = handle.is_online();
    }
}

// HTTP client for the local inference backend, plus the connectivity monitor.

pub mod client;
pub mod connectivity;
pub mod wire;

mod error;

pub use client::BackendClient;
pub use connectivity::{
    spawn_monitor, ConnectivityHandle, ConnectivityProbe, HttpProbe, PROBE_INTERVAL,
};
pub use error::NetError;
pub use wire::*;

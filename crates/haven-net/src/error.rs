use thiserror::Error;

/// Errors produced when talking to the local backend service.
///
/// The split between [`NetError::Connectivity`] and [`NetError::Backend`] is
/// load-bearing: callers decide whether a failed submission enters degraded
/// (simulated) mode purely from the error kind, never by matching message
/// text.
#[derive(Error, Debug)]
pub enum NetError {
    /// The service could not be reached at all (connect / timeout /
    /// transport failure).
    #[error("Backend unreachable: {0}")]
    Connectivity(String),

    /// The service was reachable but rejected the request.  The message is
    /// taken from the response body's `error` field when present and is
    /// surfaced to the user verbatim.
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// The response could not be decoded as the expected JSON shape.
    #[error("Invalid response from backend: {0}")]
    Decode(String),
}

impl NetError {
    /// Classify a transport-level `reqwest` error.
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_decode() {
            NetError::Decode(err.to_string())
        } else {
            // Connect refusals, DNS failures, timeouts and mid-body drops
            // all count as the service being unreachable.
            NetError::Connectivity(err.to_string())
        }
    }

    /// Whether this error means the service could not be reached.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, NetError::Connectivity(_))
    }
}

pub type Result<T> = std::result::Result<T, NetError>;

use thiserror::Error;

use haven_jobs::JobError;
use haven_net::NetError;
use haven_store::StoreError;

/// Errors surfaced to the UI layer.  One notification per operation; the
/// messages are user-facing.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Net(#[from] NetError),

    #[error(transparent)]
    Job(#[from] JobError),

    /// Local training precondition: no (user, assistant) pairs to learn
    /// from.  Raised before any network traffic.
    #[error("Not enough conversation data for training. Please have more conversations first.")]
    InsufficientData,

    /// No model has been downloaded yet, so inference and training are
    /// impossible.
    #[error("No model loaded. Please download a model first.")]
    ModelNotLoaded,

    /// The connectivity monitor says we are offline; sync is not attempted.
    #[error("Cannot sync while offline. Please check your connection and try again.")]
    Offline,
}

pub type Result<T> = std::result::Result<T, ClientError>;

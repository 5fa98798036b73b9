//! # haven-client
//!
//! Application layer of Haven: the explicit [`AppContext`], the three
//! long-running operation clients (download / training / sync), the chat
//! dispatcher and the conversation and settings command surface.  The UI
//! shell calls into this crate and renders what comes back; everything
//! durable lives in `haven-store`, everything remote in `haven-net`.

pub mod chat;
pub mod context;
pub mod conversations;
pub mod download;
pub mod model;
pub mod settings;
pub mod sync;
pub mod training;

mod error;

pub use context::AppContext;
pub use error::ClientError;

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise logging for the whole process.  Call once, early.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new("haven_client=debug,haven_jobs=debug,haven_net=info,haven_store=info,warn")
    });

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

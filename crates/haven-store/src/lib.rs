//! # haven-store
//!
//! Local persistent storage for the Haven application, backed by SQLite.
//!
//! The store is the durable source of truth for conversations, user
//! settings and downloaded-model metadata, and must stay fully usable with
//! no network.  The crate exposes a synchronous `Database` handle that
//! wraps a `rusqlite::Connection` and provides typed CRUD helpers for every
//! domain model.

pub mod conversations;
pub mod database;
pub mod migrations;
pub mod model_meta;
pub mod models;
pub mod settings;

mod error;

pub use database::Database;
pub use error::StoreError;
pub use models::*;

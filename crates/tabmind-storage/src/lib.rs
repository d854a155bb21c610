//! Tab Mind Storage Layer
//!
//! Key-value persistence for the settings blob, suspended-tab snapshots and
//! search history. The store offers get/set/remove only; there are no
//! transactions, so callers keep every read-merge-write in one synchronous step.

mod database;
mod error;
mod migrations;
mod store;

pub use database::Database;
pub use error::StorageError;
pub use store::{JsonStoreExt, KeyValueStore, MemoryStore};

pub type Result<T> = std::result::Result<T, StorageError>;

/// Key of the settings blob holding configuration, categories and sessions.
pub const SETTINGS_KEY: &str = "settings";

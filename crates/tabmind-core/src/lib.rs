//! Tab Mind Core
//!
//! The engine that ties the components together. The host browser owns the
//! tabs and the key-value store; the engine keeps derived state (categories,
//! suspension, sessions, search history) and answers front-end commands.

mod commands;
mod config;
mod engine;
mod error;
mod runtime;

pub use commands::{Command, CommandResult};
pub use config::{Config, Settings, SettingsUpdate, EXPORT_VERSION};
pub use engine::{RestoreOutcome, RestoreStatus, TabMind, TabView};
pub use error::CoreError;
pub use runtime::{Runtime, RuntimeHandle, TokioClock};

// Re-export core components
pub use tabmind_classify::{Category, IconColor, IconSpec, IconTemplate};
pub use tabmind_search::{ResultSource, SearchResult};
pub use tabmind_session::{Session, TabSnapshot};
pub use tabmind_storage::{Database, KeyValueStore, MemoryStore, StorageError};
pub use tabmind_tabs::{
    Clock, ManualClock, SystemClock, Tab, TabDirectory, TabEvent, TabId, TabManager,
};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt().with_env_filter(filter).with_target(true).init();
}

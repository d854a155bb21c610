//! Search error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SearchError {
    #[error("Storage error: {0}")]
    Storage(#[from] tabmind_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] tabmind_tabs::TabError),

    #[error("Session error: {0}")]
    Session(#[from] tabmind_session::SessionError),
}

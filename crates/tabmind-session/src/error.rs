//! Session error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] tabmind_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] tabmind_tabs::TabError),
}

impl SessionError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SessionError::NotFound(_))
    }
}

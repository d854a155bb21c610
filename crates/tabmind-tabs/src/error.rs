//! Tab error types

use thiserror::Error;

use crate::tab::TabId;

#[derive(Error, Debug)]
pub enum TabError {
    #[error("Tab not found: {0}")]
    NotFound(TabId),

    #[error("Tab unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid state transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("Storage error: {0}")]
    Storage(#[from] tabmind_storage::StorageError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl TabError {
    /// The tab closed or went away mid-operation. Callers abort quietly.
    pub fn is_transient(&self) -> bool {
        matches!(self, TabError::NotFound(_) | TabError::Unavailable(_))
    }
}

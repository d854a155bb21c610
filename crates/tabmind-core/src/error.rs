//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] tabmind_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] tabmind_tabs::TabError),

    #[error("Classification error: {0}")]
    Classify(#[from] tabmind_classify::ClassifyError),

    #[error("Session error: {0}")]
    Session(#[from] tabmind_session::SessionError),

    #[error("Search error: {0}")]
    Search(#[from] tabmind_search::SearchError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Engine not initialized")]
    NotInitialized,

    #[error("Engine runtime has stopped")]
    RuntimeClosed,
}

impl CoreError {
    /// The tab closed or went away mid-operation
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Tab(e) => e.is_transient(),
            CoreError::Classify(tabmind_classify::ClassifyError::Tab(e)) => e.is_transient(),
            CoreError::Session(tabmind_session::SessionError::Tab(e)) => e.is_transient(),
            CoreError::Search(tabmind_search::SearchError::Tab(e)) => e.is_transient(),
            _ => false,
        }
    }
}

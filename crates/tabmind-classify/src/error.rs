//! Classification error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifyError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Storage error: {0}")]
    Storage(#[from] tabmind_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] tabmind_tabs::TabError),
}

//! Tab Mind Classification
//!
//! Sorts tabs into a fixed set of topical categories using ordered domain and
//! keyword rules, keeps the category partition of tracked tabs, and derives
//! deterministic fallback icons from the same vocabulary.

mod category;
mod classifier;
mod error;
mod index;
mod thumbnail;

pub use category::Category;
pub use classifier::{classify, classify_or_general};
pub use error::ClassifyError;
pub use index::CategoryIndex;
pub use thumbnail::{IconColor, IconSpec, IconTemplate, ThumbnailSynthesizer};

pub type Result<T> = std::result::Result<T, ClassifyError>;

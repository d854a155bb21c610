//! Tab Mind Search
//!
//! Substring search over the open tabs and every saved session:
//! - queries shorter than two characters return nothing
//! - open tabs rank ahead of session tabs unless only the latter match by title
//! - the ten most recent distinct queries feed prefix suggestions

mod error;
mod history;
mod ranker;

pub use error::SearchError;
pub use history::{QueryHistory, HISTORY_KEY};
pub use ranker::{ResultSource, SearchRanker, SearchResult, MIN_QUERY_LEN};

pub type Result<T> = std::result::Result<T, SearchError>;

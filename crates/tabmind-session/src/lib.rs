//! Tab Mind Sessions
//!
//! A session is an immutable, named, timestamped snapshot of the open tab
//! set. Sessions are appended to the `sessions` section of the settings blob
//! and restored by reopening every snapshot as a background tab.

mod error;
mod manager;
mod session;

pub use error::SessionError;
pub use manager::SessionStore;
pub use session::{Session, TabSnapshot};

pub type Result<T> = std::result::Result<T, SessionError>;

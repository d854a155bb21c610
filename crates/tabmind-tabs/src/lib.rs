//! Tab Mind Tab Lifecycle
//!
//! Tabs are owned by the host browser. This crate holds the capability the
//! engine talks to (`TabDirectory`), the events the host pushes in, and the
//! per-tab suspension state machine:
//!
//! ```text
//! Active --(idle-eligible)--> Idle --(timer fires)--> Suspended
//!   ^                          |                         |
//!   +------(activated)---------+-------(activated)-------+
//! ```

mod clock;
mod directory;
mod error;
mod manager;
mod state;
mod suspend;
mod tab;
mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use directory::{TabDirectory, TabEvent};
pub use error::TabError;
pub use manager::TabManager;
pub use state::SuspensionState;
pub use suspend::{
    placeholder_url, snapshot_key, SuspendPolicy, SuspendedSnapshot, SuspensionScheduler,
    DEFAULT_ESSENTIAL_DOMAINS, DEFAULT_SUSPEND_DELAY_MINUTES,
};
pub use tab::{hostname_of, is_internal_url, Tab, TabId};
pub use timer::TimerQueue;

pub type Result<T> = std::result::Result<T, TabError>;

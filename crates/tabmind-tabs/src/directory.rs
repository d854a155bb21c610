//! Tab Directory capability
//!
//! The host browser owns the tab set. The engine only queries it, asks it to
//! open, close or re-navigate tabs, and receives its lifecycle events.

use serde::{Deserialize, Serialize};

use crate::tab::{Tab, TabId};
use crate::Result;

pub trait TabDirectory: Send + Sync {
    /// All open tabs in enumeration order
    fn query(&self) -> Result<Vec<Tab>>;

    /// Look up one tab. A closed tab yields `TabError::NotFound`.
    fn get(&self, id: TabId) -> Result<Tab>;

    /// Replace the tab's navigation target
    fn navigate(&self, id: TabId, url: &str) -> Result<Tab>;

    /// Open a new tab, focused or in the background
    fn create(&self, url: &str, active: bool) -> Result<Tab>;

    fn remove(&self, id: TabId) -> Result<()>;
}

/// Lifecycle events pushed by the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum TabEvent {
    Created {
        tab: Tab,
    },
    /// `complete` is true once the tab has finished loading
    Updated {
        tab: Tab,
        complete: bool,
    },
    #[serde(rename_all = "camelCase")]
    Activated {
        tab_id: TabId,
    },
    #[serde(rename_all = "camelCase")]
    Removed {
        tab_id: TabId,
    },
}

impl TabEvent {
    pub fn tab_id(&self) -> TabId {
        match self {
            TabEvent::Created { tab } | TabEvent::Updated { tab, .. } => tab.id,
            TabEvent::Activated { tab_id } | TabEvent::Removed { tab_id } => *tab_id,
        }
    }
}

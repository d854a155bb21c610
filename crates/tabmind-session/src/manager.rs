//! Session Store
//!
//! Handles session persistence and restoration.

use std::sync::Arc;

use tabmind_storage::{JsonStoreExt, KeyValueStore, SETTINGS_KEY};
use tabmind_tabs::{Clock, SuspendedSnapshot, Tab, TabDirectory, TabId};

use crate::error::SessionError;
use crate::session::{Session, TabSnapshot};
use crate::Result;

const SESSIONS_SECTION: &str = "sessions";

#[derive(Clone)]
pub struct SessionStore {
    store: Arc<dyn KeyValueStore>,
    directory: Arc<dyn TabDirectory>,
    clock: Arc<dyn Clock>,
}

impl SessionStore {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        directory: Arc<dyn TabDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
        }
    }

    /// Snapshot the open tabs into a new session and append it.
    ///
    /// Browser-internal pages are skipped, except suspended tabs which are
    /// saved as the page they stand in for.
    pub fn save(&self, name: Option<&str>) -> Result<Session> {
        let tabs = self.directory.query()?;

        let mut snapshots = Vec::with_capacity(tabs.len());
        for tab in &tabs {
            if let Some(snapshot) = self.snapshot_of(tab)? {
                snapshots.push(snapshot);
            }
        }

        let now = self.clock.now();
        let name = match name.map(str::trim) {
            Some(name) if !name.is_empty() => name.to_string(),
            _ => Session::default_name(now),
        };

        let session = self.store.update_section(
            SETTINGS_KEY,
            SESSIONS_SECTION,
            |sessions: &mut Vec<Session>| {
                let session = Session {
                    id: unique_id(sessions, now.timestamp_millis()),
                    name,
                    timestamp: now.timestamp_millis(),
                    tabs: snapshots,
                };
                sessions.push(session.clone());
                session
            },
        )?;

        tracing::info!(
            session_id = %session.id,
            session_name = %session.name,
            tab_count = session.tab_count(),
            "Saved session"
        );

        Ok(session)
    }

    /// All sessions in the order they were saved
    pub fn list(&self) -> Result<Vec<Session>> {
        Ok(self.store.read_section(SETTINGS_KEY, SESSIONS_SECTION)?)
    }

    pub fn get(&self, session_id: &str) -> Result<Session> {
        self.list()?
            .into_iter()
            .find(|s| s.id == session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Reopen every tab of a session in the background, in saved order.
    ///
    /// Tabs that are already open are opened again. A snapshot the host
    /// refuses to open is logged and skipped.
    pub fn restore(&self, session_id: &str) -> Result<Vec<TabId>> {
        let session = self.get(session_id)?;

        let mut opened = Vec::with_capacity(session.tabs.len());
        for snapshot in &session.tabs {
            match self.directory.create(&snapshot.url, false) {
                Ok(tab) => opened.push(tab.id),
                Err(e) => {
                    tracing::warn!(url = %snapshot.url, error = %e, "Failed to reopen session tab")
                }
            }
        }

        tracing::info!(
            session_id = %session.id,
            tab_count = opened.len(),
            "Restored session"
        );

        Ok(opened)
    }

    fn snapshot_of(&self, tab: &Tab) -> Result<Option<TabSnapshot>> {
        if !tab.is_internal() {
            return Ok(Some(TabSnapshot::from(tab)));
        }

        Ok(SuspendedSnapshot::load(self.store.as_ref(), tab.id)?.map(TabSnapshot::from))
    }
}

fn unique_id(sessions: &[Session], millis: i64) -> String {
    let mut candidate = millis;
    while sessions.iter().any(|s| s.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

//! Suspension Scheduler
//!
//! Tracks the suspension state of every tab the engine has seen and owns the
//! per-tab idle timers. A suspended tab is navigated to an internal
//! placeholder page; its original url/title/favicon live in a persisted
//! [`SuspendedSnapshot`] until the tab is activated again.
//!
//! Invariant: a snapshot for a tab id exists in the store iff that tab is
//! in the `Suspended` state.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tabmind_storage::{JsonStoreExt, KeyValueStore};

use crate::clock::{to_chrono, Clock};
use crate::directory::TabDirectory;
use crate::error::TabError;
use crate::state::SuspensionState;
use crate::tab::{hostname_of, is_internal_url, Tab, TabId};
use crate::timer::TimerQueue;
use crate::Result;

/// Page a suspended tab is parked on
const PLACEHOLDER_PAGE: &str = "chrome-extension://tabmind/suspended.html";

pub const DEFAULT_SUSPEND_DELAY_MINUTES: u64 = 30;

/// Conferencing and media hosts that keep working in the background
pub const DEFAULT_ESSENTIAL_DOMAINS: &[&str] = &[
    "music.youtube.com",
    "meet.google.com",
    "zoom.us",
    "teams.microsoft.com",
    "spotify.com",
    "discord.com",
];

pub fn placeholder_url(id: TabId) -> String {
    format!("{}?id={}", PLACEHOLDER_PAGE, id)
}

pub fn snapshot_key(id: TabId) -> String {
    format!("suspended_{}", id)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuspendedSnapshot {
    pub id: TabId,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
}

impl SuspendedSnapshot {
    pub fn of(tab: &Tab) -> Self {
        Self {
            id: tab.id,
            url: tab.url.clone(),
            title: tab.title.clone(),
            fav_icon_url: tab.fav_icon_url.clone(),
        }
    }

    pub fn load(store: &dyn KeyValueStore, id: TabId) -> Result<Option<Self>> {
        Ok(store.get_json(&snapshot_key(id))?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuspendPolicy {
    pub auto_suspend: bool,
    /// Idle time before a background tab is suspended
    pub delay: Duration,
    /// Lowercased hostnames exempt from idle suspension
    pub essential_domains: HashSet<String>,
}

impl SuspendPolicy {
    pub fn is_essential(&self, hostname: &str) -> bool {
        self.essential_domains.contains(hostname)
    }
}

impl Default for SuspendPolicy {
    fn default() -> Self {
        Self {
            auto_suspend: true,
            delay: Duration::from_secs(DEFAULT_SUSPEND_DELAY_MINUTES * 60),
            essential_domains: DEFAULT_ESSENTIAL_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

pub struct SuspensionScheduler {
    store: Arc<dyn KeyValueStore>,
    directory: Arc<dyn TabDirectory>,
    clock: Arc<dyn Clock>,
    policy: SuspendPolicy,
    /// Non-active states only; absent means Active
    states: HashMap<TabId, SuspensionState>,
    timers: TimerQueue,
}

impl SuspensionScheduler {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        directory: Arc<dyn TabDirectory>,
        clock: Arc<dyn Clock>,
        policy: SuspendPolicy,
    ) -> Self {
        Self {
            store,
            directory,
            clock,
            policy,
            states: HashMap::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn policy(&self) -> &SuspendPolicy {
        &self.policy
    }

    /// Applies to eligibility checks from now on. Pending timers keep their deadlines.
    pub fn set_policy(&mut self, policy: SuspendPolicy) {
        self.policy = policy;
    }

    pub fn state_of(&self, id: TabId) -> SuspensionState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    pub fn is_suspended(&self, id: TabId) -> bool {
        self.state_of(id).is_suspended()
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.next_deadline()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Mark every open tab that still has a persisted snapshot as suspended.
    pub fn rehydrate(&mut self) -> Result<usize> {
        let mut restored = 0;
        for tab in self.directory.query()? {
            if SuspendedSnapshot::load(self.store.as_ref(), tab.id)?.is_some() {
                self.states.insert(tab.id, SuspensionState::Suspended);
                restored += 1;
            }
        }

        if restored > 0 {
            tracing::info!(count = restored, "Rehydrated suspended tabs");
        }

        Ok(restored)
    }

    /// A tab finished loading. Starts (or restarts) its idle timer when the
    /// tab is eligible. Returns whether a timer is now pending.
    pub fn on_tab_ready(&mut self, tab: &Tab) -> Result<bool> {
        // Covers the placeholder load that follows our own suspend
        if self.is_suspended(tab.id) {
            return Ok(false);
        }

        if tab.active || is_internal_url(&tab.url) || !self.policy.auto_suspend {
            return Ok(false);
        }

        let hostname = match hostname_of(&tab.url) {
            Ok(hostname) => hostname,
            Err(_) => {
                tracing::debug!(tab_id = %tab.id, url = %tab.url, "Skipping idle timer for unparseable URL");
                return Ok(false);
            }
        };

        if self.policy.is_essential(&hostname) {
            tracing::debug!(tab_id = %tab.id, hostname = %hostname, "Essential domain, not scheduling");
            return Ok(false);
        }

        let deadline = self.clock.now() + to_chrono(self.policy.delay);
        self.timers.schedule(tab.id, deadline);
        self.transition(tab.id, SuspensionState::Idle)?;

        tracing::debug!(tab_id = %tab.id, deadline = %deadline, "Scheduled idle suspension");

        Ok(true)
    }

    /// A tab was focused. Cancels a pending timer or restores a suspended tab.
    pub fn on_activated(&mut self, id: TabId) -> Result<()> {
        match self.state_of(id) {
            SuspensionState::Suspended => {
                self.restore(id)?;
            }
            SuspensionState::Idle => {
                self.timers.cancel(id);
                self.transition(id, SuspensionState::Active)?;
                tracing::debug!(tab_id = %id, "Cancelled idle timer on activation");
            }
            SuspensionState::Active => {}
        }
        Ok(())
    }

    /// A tab was closed
    pub fn on_removed(&mut self, id: TabId) -> Result<()> {
        self.timers.cancel(id);
        if self.states.remove(&id) == Some(SuspensionState::Suspended) {
            self.store.remove(&snapshot_key(id))?;
        }
        Ok(())
    }

    /// Suspend every tab whose idle deadline has passed. Failures are logged
    /// per tab and never abort the sweep.
    pub fn fire_due(&mut self) -> Vec<TabId> {
        let due = self.timers.take_due(self.clock.now());
        let mut suspended = Vec::new();

        for id in due {
            match self.suspend(id) {
                Ok(true) => suspended.push(id),
                Ok(false) => {}
                Err(e) => tracing::warn!(tab_id = %id, error = %e, "Idle suspension failed"),
            }
        }

        suspended
    }

    /// Suspend a tab now. No-op (Ok(false)) when the tab is closed, focused,
    /// internal, or already suspended.
    pub fn suspend(&mut self, id: TabId) -> Result<bool> {
        self.timers.cancel(id);

        if self.is_suspended(id) {
            tracing::debug!(tab_id = %id, "Tab already suspended");
            return Ok(false);
        }

        let tab = match self.directory.get(id) {
            Ok(tab) => tab,
            Err(e) if e.is_transient() => {
                tracing::debug!(tab_id = %id, error = %e, "Tab already closed or unavailable");
                self.states.remove(&id);
                return Ok(false);
            }
            Err(e) => return Err(e),
        };

        if tab.active || tab.is_internal() {
            self.transition(id, SuspensionState::Active)?;
            return Ok(false);
        }

        let key = snapshot_key(id);
        self.store.set_json(&key, &SuspendedSnapshot::of(&tab))?;

        if let Err(e) = self.directory.navigate(id, &placeholder_url(id)) {
            self.store.remove(&key)?;
            if e.is_transient() {
                tracing::warn!(tab_id = %id, error = %e, "Tab closed while suspending");
                self.states.remove(&id);
                return Ok(false);
            }
            return Err(e);
        }

        self.transition(id, SuspensionState::Suspended)?;

        tracing::info!(tab_id = %id, url = %tab.url, "Suspended tab");

        Ok(true)
    }

    /// Navigate a suspended tab back to its snapshot URL and drop the snapshot.
    pub fn restore(&mut self, id: TabId) -> Result<bool> {
        let key = snapshot_key(id);
        let snapshot = match SuspendedSnapshot::load(self.store.as_ref(), id)? {
            Some(snapshot) => snapshot,
            None => {
                tracing::warn!(tab_id = %id, "Suspended tab has no snapshot");
                self.states.remove(&id);
                return Ok(false);
            }
        };

        if let Err(e) = self.directory.navigate(id, &snapshot.url) {
            if e.is_transient() {
                tracing::warn!(tab_id = %id, error = %e, "Tab closed before restore");
                self.store.remove(&key)?;
                self.states.remove(&id);
                return Ok(false);
            }
            return Err(e);
        }

        self.store.remove(&key)?;
        self.transition(id, SuspensionState::Active)?;

        tracing::info!(tab_id = %id, url = %snapshot.url, "Restored tab");

        Ok(true)
    }

    /// Cancel every outstanding idle timer. Suspended tabs stay suspended.
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self.timers.cancel_all();
        self.states.retain(|_, state| state.is_suspended());
        cancelled
    }

    fn transition(&mut self, id: TabId, to: SuspensionState) -> Result<()> {
        let from = self.state_of(id);
        if !from.can_transition_to(to) {
            return Err(TabError::InvalidTransition {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        if from != to {
            tracing::debug!(tab_id = %id, from = %from, to = %to, "Suspension state transition");
        }

        if to == SuspensionState::Active {
            self.states.remove(&id);
        } else {
            self.states.insert(id, to);
        }

        Ok(())
    }
}

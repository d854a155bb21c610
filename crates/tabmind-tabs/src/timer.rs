//! Per-tab idle deadlines
//!
//! One pending deadline per tab id. Cancelling removes the entry, so a cancel
//! issued in the same turn a deadline would fire always wins.

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::tab::TabId;

#[derive(Debug, Default)]
pub struct TimerQueue {
    deadlines: HashMap<TabId, DateTime<Utc>>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule (or reschedule) the deadline for a tab. Returns the replaced deadline.
    pub fn schedule(&mut self, id: TabId, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.deadlines.insert(id, at)
    }

    /// Idempotent: cancelling an absent timer returns false.
    pub fn cancel(&mut self, id: TabId) -> bool {
        self.deadlines.remove(&id).is_some()
    }

    pub fn cancel_all(&mut self) -> usize {
        let count = self.deadlines.len();
        self.deadlines.clear();
        count
    }

    pub fn is_pending(&self, id: TabId) -> bool {
        self.deadlines.contains_key(&id)
    }

    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.deadlines.values().min().copied()
    }

    /// Remove and return every tab whose deadline is at or before `now`,
    /// earliest first.
    pub fn take_due(&mut self, now: DateTime<Utc>) -> Vec<TabId> {
        let mut due: Vec<(DateTime<Utc>, TabId)> = self
            .deadlines
            .iter()
            .filter(|(_, at)| **at <= now)
            .map(|(id, at)| (*at, *id))
            .collect();
        due.sort();

        for (_, id) in &due {
            self.deadlines.remove(id);
        }

        due.into_iter().map(|(_, id)| id).collect()
    }

    pub fn len(&self) -> usize {
        self.deadlines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deadlines.is_empty()
    }
}

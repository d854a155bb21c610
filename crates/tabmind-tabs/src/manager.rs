//! Tab Manager
//!
//! In-memory [`TabDirectory`] for hosts that keep their own tab table and for
//! tests. Tabs keep insertion order; at most one tab is focused.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::directory::TabDirectory;
use crate::error::TabError;
use crate::tab::{Tab, TabId};
use crate::Result;

#[derive(Default)]
struct TabTable {
    tabs: Vec<Tab>,
    next_id: u64,
}

impl TabTable {
    fn position(&self, id: TabId) -> Result<usize> {
        self.tabs
            .iter()
            .position(|t| t.id == id)
            .ok_or(TabError::NotFound(id))
    }

    fn focus(&mut self, index: usize) {
        for (i, tab) in self.tabs.iter_mut().enumerate() {
            tab.active = i == index;
        }
    }
}

pub struct TabManager {
    table: Arc<RwLock<TabTable>>,
}

impl TabManager {
    pub fn new() -> Self {
        Self {
            table: Arc::new(RwLock::new(TabTable {
                tabs: Vec::new(),
                next_id: 1,
            })),
        }
    }

    /// Open a background tab with a title already known
    pub fn open(&self, url: &str, title: &str) -> Tab {
        let mut table = self.table.write();
        let tab = Tab::new(TabId(table.next_id), url).with_title(title);
        table.next_id += 1;
        table.tabs.push(tab.clone());
        tab
    }

    /// Focus a tab, blurring every other tab
    pub fn activate(&self, id: TabId) -> Result<Tab> {
        let mut table = self.table.write();
        let index = table.position(id)?;
        table.focus(index);
        Ok(table.tabs[index].clone())
    }

    pub fn set_favicon(&self, id: TabId, fav_icon_url: Option<String>) -> Result<Tab> {
        let mut table = self.table.write();
        let index = table.position(id)?;
        table.tabs[index].fav_icon_url = fav_icon_url;
        Ok(table.tabs[index].clone())
    }

    pub fn len(&self) -> usize {
        self.table.read().tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().tabs.is_empty()
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

impl TabDirectory for TabManager {
    fn query(&self) -> Result<Vec<Tab>> {
        Ok(self.table.read().tabs.clone())
    }

    fn get(&self, id: TabId) -> Result<Tab> {
        let table = self.table.read();
        let index = table.position(id)?;
        Ok(table.tabs[index].clone())
    }

    fn navigate(&self, id: TabId, url: &str) -> Result<Tab> {
        if url.is_empty() {
            return Err(TabError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let mut table = self.table.write();
        let index = table.position(id)?;
        table.tabs[index].url = url.to_string();

        tracing::debug!(tab_id = %id, url = %url, "Navigated tab");

        Ok(table.tabs[index].clone())
    }

    fn create(&self, url: &str, active: bool) -> Result<Tab> {
        if url.is_empty() {
            return Err(TabError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let mut table = self.table.write();
        let tab = Tab::new(TabId(table.next_id), url);
        table.next_id += 1;
        table.tabs.push(tab);

        let index = table.tabs.len() - 1;
        if active {
            table.focus(index);
        }

        tracing::info!(tab_id = %table.tabs[index].id, url = %url, "Created new tab");

        Ok(table.tabs[index].clone())
    }

    fn remove(&self, id: TabId) -> Result<()> {
        let mut table = self.table.write();
        let index = table.position(id)?;
        table.tabs.remove(index);

        tracing::info!(tab_id = %id, "Closed tab");

        Ok(())
    }
}

impl Clone for TabManager {
    fn clone(&self) -> Self {
        Self {
            table: Arc::clone(&self.table),
        }
    }
}

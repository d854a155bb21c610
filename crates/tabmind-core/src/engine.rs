//! Tab Mind engine
//!
//! Owns every piece of process-scoped state (category index, suspension
//! states and timers, icon cache, query history) and routes host events and
//! front-end commands to the components. Not thread-safe by itself; the
//! runtime drives it from a single task.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tabmind_classify::{Category, CategoryIndex, IconSpec, ThumbnailSynthesizer};
use tabmind_search::{SearchRanker, SearchResult};
use tabmind_session::{Session, SessionStore};
use tabmind_storage::{Database, KeyValueStore};
use tabmind_tabs::{
    Clock, SuspensionScheduler, SystemClock, Tab, TabDirectory, TabEvent, TabId,
};

use crate::commands::{Command, CommandResult};
use crate::config::{Config, Settings, SettingsUpdate};
use crate::error::CoreError;
use crate::Result;

/// A tab as listed in the categorized overview
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabView {
    pub id: TabId,
    pub title: String,
    pub url: String,
    pub fav_icon_url: Option<String>,
    pub active: bool,
    pub suspended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RestoreStatus {
    Restored,
    NotFound,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestoreOutcome {
    pub status: RestoreStatus,
    /// Tabs opened for the session, in saved order
    pub tabs: Vec<TabId>,
}

pub struct TabMind {
    store: Arc<dyn KeyValueStore>,
    directory: Arc<dyn TabDirectory>,
    clock: Arc<dyn Clock>,
    settings: Settings,
    categories: CategoryIndex,
    scheduler: SuspensionScheduler,
    sessions: SessionStore,
    search: SearchRanker,
    thumbnails: ThumbnailSynthesizer,
    initialized: bool,
}

impl TabMind {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        directory: Arc<dyn TabDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let settings = Settings::default();
        let scheduler = SuspensionScheduler::new(
            store.clone(),
            directory.clone(),
            clock.clone(),
            settings.policy(),
        );
        let sessions = SessionStore::new(store.clone(), directory.clone(), clock.clone());
        let search = SearchRanker::new(directory.clone(), sessions.clone(), store.clone());

        Self {
            store,
            directory,
            clock,
            settings,
            categories: CategoryIndex::new(),
            scheduler,
            sessions,
            search,
            thumbnails: ThumbnailSynthesizer::new(),
            initialized: false,
        }
    }

    /// Engine backed by the on-disk database named in `config`
    pub fn open(config: &Config, directory: Arc<dyn TabDirectory>) -> Result<Self> {
        if let Some(parent) = config.database_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let db = Database::open(&config.database_path)?;
        Ok(Self::new(Arc::new(db), directory, Arc::new(SystemClock)))
    }

    /// Load persisted state and re-attach tabs that were suspended before
    /// the last shutdown.
    pub fn initialize(&mut self) -> Result<()> {
        Settings::ensure_initialized(self.store.as_ref())?;
        self.settings = Settings::load(self.store.as_ref())?;
        self.scheduler.set_policy(self.settings.policy());
        self.categories = CategoryIndex::load(self.store.as_ref())?;
        self.search.load_history()?;
        let suspended = self.scheduler.rehydrate()?;

        self.initialized = true;

        tracing::info!(
            categorized = self.categories.len(),
            suspended,
            "Tab Mind initialized"
        );

        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    // === Host events ===

    /// Apply one host event. Tabs that vanish mid-event are logged and skipped.
    pub fn handle_event(&mut self, event: TabEvent) -> Result<()> {
        let tab_id = event.tab_id();
        let result = match event {
            TabEvent::Created { tab } => self.categorize(&tab),
            TabEvent::Updated {
                tab,
                complete: true,
            } => self.categorize(&tab).and_then(|_| {
                self.scheduler.on_tab_ready(&tab)?;
                Ok(())
            }),
            TabEvent::Updated {
                complete: false, ..
            } => Ok(()),
            TabEvent::Activated { tab_id } => {
                self.scheduler.on_activated(tab_id).map_err(CoreError::from)
            }
            TabEvent::Removed { tab_id } => self.forget(tab_id),
        };

        absorb_transient(result, tab_id)
    }

    fn categorize(&mut self, tab: &Tab) -> Result<()> {
        if tab.is_internal() {
            return Ok(());
        }

        let category = tabmind_classify::classify_or_general(&tab.url, &tab.title);
        self.categories.assign(tab.id, category);
        self.persist_categories()
    }

    fn forget(&mut self, id: TabId) -> Result<()> {
        self.scheduler.on_removed(id)?;
        self.categories.remove(id);
        self.persist_categories()
    }

    fn persist_categories(&mut self) -> Result<()> {
        if self.categories.is_dirty() {
            self.categories.persist(self.store.as_ref())?;
        }
        Ok(())
    }

    // === Timers ===

    /// Earliest pending idle deadline
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.scheduler.next_deadline()
    }

    /// Suspend every tab whose idle deadline has passed
    pub fn fire_due_timers(&mut self) -> Vec<TabId> {
        self.scheduler.fire_due()
    }

    /// Cancel all outstanding timers. Returns how many were cancelled.
    pub fn shutdown(&mut self) -> usize {
        let cancelled = self.scheduler.shutdown();
        tracing::info!(cancelled, "Tab Mind shut down");
        cancelled
    }

    // === Operations ===

    /// Open tabs grouped by category. Browser-internal pages are left out,
    /// except tabs parked by suspension.
    pub fn categorized_tabs(&mut self) -> Result<BTreeMap<Category, Vec<TabView>>> {
        let tabs = self.directory.query()?;
        let recorded: HashMap<TabId, Category> = self
            .categories
            .snapshot_of(&tabs)
            .into_iter()
            .flat_map(|(category, ids)| ids.into_iter().map(move |id| (id, category)))
            .collect();

        let mut grouped: BTreeMap<Category, Vec<TabView>> =
            Category::ALL.iter().map(|c| (*c, Vec::new())).collect();

        for tab in tabs {
            let suspended = self.scheduler.is_suspended(tab.id);
            if tab.is_internal() && !suspended {
                continue;
            }

            let category = match recorded.get(&tab.id) {
                Some(category) => *category,
                None => self.categories.categorize(&tab),
            };
            grouped.entry(category).or_default().push(TabView {
                id: tab.id,
                title: tab.title,
                url: tab.url,
                fav_icon_url: tab.fav_icon_url,
                active: tab.active,
                suspended,
            });
        }

        self.persist_categories()?;
        Ok(grouped)
    }

    pub fn save_session(&mut self, name: Option<&str>) -> Result<Session> {
        Ok(self.sessions.save(name)?)
    }

    pub fn sessions(&self) -> Result<Vec<Session>> {
        Ok(self.sessions.list()?)
    }

    /// Reopen a saved session. An unknown id is reported, not an error.
    pub fn restore_session(&mut self, session_id: &str) -> Result<RestoreOutcome> {
        match self.sessions.restore(session_id) {
            Ok(tabs) => Ok(RestoreOutcome {
                status: RestoreStatus::Restored,
                tabs,
            }),
            Err(e) if e.is_not_found() => {
                tracing::info!(session_id = %session_id, "Session not found, nothing restored");
                Ok(RestoreOutcome {
                    status: RestoreStatus::NotFound,
                    tabs: Vec::new(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    pub fn search(&mut self, query: &str) -> Result<Vec<SearchResult>> {
        Ok(self.search.search(query)?)
    }

    pub fn suggestions(&self, prefix: &str) -> Vec<String> {
        self.search.suggestions(prefix)
    }

    /// Suspend a tab on request. Returns false when there was nothing to do.
    pub fn suspend_tab(&mut self, id: TabId) -> Result<bool> {
        Ok(self.scheduler.suspend(id)?)
    }

    /// Close a tab. Closing a tab that is already gone succeeds.
    pub fn close_tab(&mut self, id: TabId) -> Result<()> {
        match self.directory.remove(id) {
            Ok(()) => {}
            Err(e) if e.is_transient() => {
                tracing::debug!(tab_id = %id, error = %e, "Tab already closed");
            }
            Err(e) => return Err(e.into()),
        }
        self.forget(id)
    }

    pub fn icon_for(&mut self, url: &str, title: &str) -> IconSpec {
        self.thumbnails.icon_for(url, title)
    }

    pub fn category_of(&mut self, id: TabId) -> Result<Option<Category>> {
        let category = self.categories.category_of(id, self.directory.as_ref())?;
        self.persist_categories()?;
        Ok(category)
    }

    // === Settings ===

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn update_settings(&mut self, update: SettingsUpdate) -> Result<Settings> {
        let mut settings = self.settings.clone();
        settings.apply(update);
        self.replace_settings(settings)
    }

    pub fn add_essential_domain(&mut self, domain: &str) -> Result<bool> {
        let mut settings = self.settings.clone();
        if !settings.add_essential_domain(domain) {
            return Ok(false);
        }
        self.replace_settings(settings)?;
        Ok(true)
    }

    pub fn remove_essential_domain(&mut self, domain: &str) -> Result<bool> {
        let mut settings = self.settings.clone();
        if !settings.remove_essential_domain(domain) {
            return Ok(false);
        }
        self.replace_settings(settings)?;
        Ok(true)
    }

    /// Restore default settings. Saved sessions and categories are kept.
    pub fn reset_settings(&mut self) -> Result<Settings> {
        self.replace_settings(Settings::default())
    }

    pub fn export_settings(&self) -> Result<String> {
        Settings::export(self.store.as_ref(), self.clock.now())
    }

    /// Replace the stored settings blob from an export document and reload
    pub fn import_settings(&mut self, document: &str) -> Result<bool> {
        if !Settings::import(self.store.as_ref(), document)? {
            return Ok(false);
        }

        self.settings = Settings::load(self.store.as_ref())?;
        self.scheduler.set_policy(self.settings.policy());
        self.categories = CategoryIndex::load(self.store.as_ref())?;
        Ok(true)
    }

    fn replace_settings(&mut self, settings: Settings) -> Result<Settings> {
        settings.save(self.store.as_ref())?;
        self.scheduler.set_policy(settings.policy());
        self.settings = settings;

        tracing::info!(
            auto_suspend = self.settings.auto_suspend,
            suspend_delay = self.settings.suspend_delay,
            essential_domains = self.settings.essential_domains.len(),
            "Settings updated"
        );

        Ok(self.settings.clone())
    }

    // === Commands ===

    pub fn execute(&mut self, command: Command) -> CommandResult<Value> {
        if !self.initialized {
            return CommandResult::err(CoreError::NotInitialized.to_string());
        }

        match self.dispatch(command) {
            Ok(Some(data)) => CommandResult::ok(data),
            Ok(None) => CommandResult::done(),
            Err(e) => {
                tracing::warn!(error = %e, "Command failed");
                CommandResult::err(e.to_string())
            }
        }
    }

    /// Execute a raw JSON request, answering unknown actions in kind
    pub fn execute_json(&mut self, request: &str) -> CommandResult<Value> {
        let raw: Value = match serde_json::from_str(request) {
            Ok(raw) => raw,
            Err(e) => return CommandResult::err(e.to_string()),
        };

        let known = raw
            .get("action")
            .and_then(Value::as_str)
            .is_some_and(Command::is_known_action);
        if !known {
            return CommandResult::err("Unknown action".to_string());
        }

        match serde_json::from_value::<Command>(raw) {
            Ok(command) => self.execute(command),
            Err(e) => CommandResult::err(e.to_string()),
        }
    }

    fn dispatch(&mut self, command: Command) -> Result<Option<Value>> {
        let data = match command {
            Command::GetTabs => Some(serde_json::to_value(self.categorized_tabs()?)?),
            Command::SaveSession { name } => {
                Some(serde_json::to_value(self.save_session(name.as_deref())?)?)
            }
            Command::RestoreSession { session_id } => {
                Some(serde_json::to_value(self.restore_session(&session_id)?)?)
            }
            Command::SearchTabs { query } => Some(serde_json::to_value(self.search(&query)?)?),
            Command::SuspendTab { tab_id } => {
                self.suspend_tab(tab_id)?;
                None
            }
            Command::CloseTab { tab_id } => {
                self.close_tab(tab_id)?;
                None
            }
            Command::ListSessions => Some(serde_json::to_value(self.sessions()?)?),
            Command::GetSuggestions { prefix } => {
                Some(serde_json::to_value(self.suggestions(&prefix))?)
            }
            Command::GetSettings => Some(serde_json::to_value(self.settings())?),
            Command::UpdateSettings { settings } => {
                Some(serde_json::to_value(self.update_settings(settings)?)?)
            }
            Command::GetIcon { url, title } => {
                Some(serde_json::to_value(self.icon_for(&url, &title))?)
            }
        };
        Ok(data)
    }
}

fn absorb_transient(result: Result<()>, tab_id: TabId) -> Result<()> {
    match result {
        Err(e) if e.is_transient() => {
            tracing::warn!(tab_id = %tab_id, error = %e, "Tab went away during event");
            Ok(())
        }
        other => other,
    }
}

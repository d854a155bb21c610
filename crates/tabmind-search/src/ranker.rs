//! Search Ranker

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use tabmind_session::{Session, SessionStore, TabSnapshot};
use tabmind_storage::KeyValueStore;
use tabmind_tabs::{hostname_of, Tab, TabDirectory, TabId};

use crate::history::QueryHistory;
use crate::Result;

/// Shortest trimmed query that is searched at all, in UTF-16 units
pub const MIN_QUERY_LEN: usize = 2;

/// Length as the popup measures it
pub(crate) fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultSource {
    Current,
    Session,
}

impl ResultSource {
    /// Lower ranks first
    pub fn priority(&self) -> u8 {
        match self {
            ResultSource::Current => 1,
            ResultSource::Session => 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub fav_icon_url: Option<String>,
    pub source: ResultSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<TabId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
}

impl SearchResult {
    fn current(tab: Tab) -> Self {
        Self {
            title: tab.title,
            url: tab.url,
            fav_icon_url: tab.fav_icon_url,
            source: ResultSource::Current,
            tab_id: Some(tab.id),
            session_name: None,
            session_id: None,
            timestamp: None,
        }
    }

    fn saved(snapshot: &TabSnapshot, session: &Session) -> Self {
        Self {
            title: snapshot.title.clone(),
            url: snapshot.url.clone(),
            fav_icon_url: snapshot.fav_icon_url.clone(),
            source: ResultSource::Session,
            tab_id: None,
            session_name: Some(session.name.clone()),
            session_id: Some(session.id.clone()),
            timestamp: Some(session.timestamp),
        }
    }
}

pub struct SearchRanker {
    directory: Arc<dyn TabDirectory>,
    sessions: SessionStore,
    store: Arc<dyn KeyValueStore>,
    history: QueryHistory,
}

impl SearchRanker {
    pub fn new(
        directory: Arc<dyn TabDirectory>,
        sessions: SessionStore,
        store: Arc<dyn KeyValueStore>,
    ) -> Self {
        Self {
            directory,
            sessions,
            store,
            history: QueryHistory::new(),
        }
    }

    /// Replace the in-memory history with the persisted one
    pub fn load_history(&mut self) -> Result<()> {
        self.history = QueryHistory::load(self.store.as_ref())?;
        Ok(())
    }

    pub fn history(&self) -> &QueryHistory {
        &self.history
    }

    /// Rank open tabs and saved session tabs matching `query`.
    pub fn search(&mut self, query: &str) -> Result<Vec<SearchResult>> {
        let query = query.trim();
        if utf16_len(query) < MIN_QUERY_LEN {
            return Ok(Vec::new());
        }

        if self.history.record(query) {
            self.history.persist(self.store.as_ref())?;
        }

        let needle = query.to_lowercase();
        let mut results: Vec<SearchResult> = self
            .directory
            .query()?
            .into_iter()
            .filter(|tab| matches(&tab.title, &tab.url, &needle))
            .map(SearchResult::current)
            .collect();

        for session in self.sessions.list()? {
            results.extend(
                session
                    .tabs
                    .iter()
                    .filter(|snapshot| matches(&snapshot.title, &snapshot.url, &needle))
                    .map(|snapshot| SearchResult::saved(snapshot, &session)),
            );
        }

        rank(&mut results, &needle);

        tracing::debug!(query = %query, results = results.len(), "Searched tabs");

        Ok(results)
    }

    pub fn suggestions(&self, prefix: &str) -> Vec<String> {
        self.history.suggestions(prefix)
    }
}

fn matches(title: &str, url: &str, needle: &str) -> bool {
    title.to_lowercase().contains(needle)
        || url.to_lowercase().contains(needle)
        || hostname_of(url).unwrap_or_default().contains(needle)
}

/// Stable sort: title hits first, then current before session, then shorter
/// titles. Equal keys keep gathering order.
fn rank(results: &mut [SearchResult], needle: &str) {
    results.sort_by_key(|r| {
        (
            !r.title.to_lowercase().contains(needle),
            r.source.priority(),
            utf16_len(&r.title),
        )
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tabmind_storage::MemoryStore;
    use tabmind_tabs::{ManualClock, TabManager};

    /// Directory that counts every call before delegating
    struct CountingDirectory {
        inner: TabManager,
        calls: AtomicUsize,
    }

    impl TabDirectory for CountingDirectory {
        fn query(&self) -> tabmind_tabs::Result<Vec<Tab>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.query()
        }

        fn get(&self, id: TabId) -> tabmind_tabs::Result<Tab> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(id)
        }

        fn navigate(&self, id: TabId, url: &str) -> tabmind_tabs::Result<Tab> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.navigate(id, url)
        }

        fn create(&self, url: &str, active: bool) -> tabmind_tabs::Result<Tab> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.create(url, active)
        }

        fn remove(&self, id: TabId) -> tabmind_tabs::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.remove(id)
        }
    }

    /// Store that counts every call before delegating
    #[derive(Default)]
    struct CountingStore {
        inner: MemoryStore,
        calls: AtomicUsize,
    }

    impl KeyValueStore for CountingStore {
        fn get(&self, key: &str) -> tabmind_storage::Result<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.get(key)
        }

        fn set(&self, key: &str, value: &str) -> tabmind_storage::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.set(key, value)
        }

        fn remove(&self, key: &str) -> tabmind_storage::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.inner.remove(key)
        }
    }

    struct Fixture {
        tabs: Arc<CountingDirectory>,
        store: Arc<CountingStore>,
        sessions: SessionStore,
        ranker: SearchRanker,
    }

    fn fixture() -> Fixture {
        let tabs = Arc::new(CountingDirectory {
            inner: TabManager::new(),
            calls: AtomicUsize::new(0),
        });
        let store = Arc::new(CountingStore::default());
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap(),
        ));
        let sessions = SessionStore::new(store.clone(), tabs.clone(), clock);
        let ranker = SearchRanker::new(tabs.clone(), sessions.clone(), store.clone());

        Fixture {
            tabs,
            store,
            sessions,
            ranker,
        }
    }

    /// Save a session holding exactly `pages`, leaving the open tabs untouched
    fn save_session(fx: &Fixture, name: &str, pages: &[(&str, &str)]) -> Session {
        let open: Vec<TabId> = fx.tabs.inner.query().unwrap().iter().map(|t| t.id).collect();
        for id in &open {
            fx.tabs.inner.remove(*id).unwrap();
        }
        let saved: Vec<TabId> = pages
            .iter()
            .map(|(url, title)| fx.tabs.inner.open(url, title).id)
            .collect();

        let session = fx.sessions.save(Some(name)).unwrap();

        for id in saved {
            fx.tabs.inner.remove(id).unwrap();
        }
        session
    }

    #[test]
    fn test_current_tab_ranks_before_session_tab() {
        let fx = fixture();
        let session = save_session(&fx, "Reading", &[("https://example.com", "docs")]);
        fx.tabs.inner.open("https://docs.google.com", "My Document");

        let mut ranker = fx.ranker;
        let results = ranker.search("doc").unwrap();

        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "My Document");
        assert_eq!(results[0].source, ResultSource::Current);
        assert!(results[0].tab_id.is_some());

        assert_eq!(results[1].title, "docs");
        assert_eq!(results[1].source, ResultSource::Session);
        assert_eq!(results[1].session_name.as_deref(), Some("Reading"));
        assert_eq!(results[1].session_id.as_deref(), Some(session.id.as_str()));
    }

    #[test]
    fn test_title_match_beats_source() {
        let fx = fixture();
        save_session(&fx, "Saved", &[("https://example.com/a", "Rust Book")]);
        // Matches on hostname only
        fx.tabs.inner.open("https://rust-lang.org", "Home");

        let mut ranker = fx.ranker;
        let results = ranker.search("rust").unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["Rust Book", "Home"]);
    }

    #[test]
    fn test_ties_keep_gathering_order() {
        let fx = fixture();
        fx.tabs.inner.open("https://a.example/tokio", "tokio one");
        fx.tabs.inner.open("https://b.example/tokio", "tokio two");
        fx.tabs.inner.open("https://c.example/tokio", "tokio");

        let mut ranker = fx.ranker;
        let results = ranker.search("TOKIO").unwrap();

        let urls: Vec<&str> = results.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://c.example/tokio",
                "https://a.example/tokio",
                "https://b.example/tokio"
            ]
        );
    }

    #[test]
    fn test_short_query_touches_nothing() {
        let fx = fixture();
        let mut ranker = fx.ranker;

        assert!(ranker.search("d").unwrap().is_empty());
        assert!(ranker.search("  x  ").unwrap().is_empty());

        assert_eq!(fx.tabs.calls.load(Ordering::SeqCst), 0);
        assert_eq!(fx.store.calls.load(Ordering::SeqCst), 0);
        assert!(ranker.history().is_empty());
    }

    #[test]
    fn test_lengths_count_utf16_units() {
        assert_eq!(utf16_len("ab"), 2);
        assert_eq!(utf16_len("é"), 1);
        assert_eq!(utf16_len("😀"), 2);

        let fx = fixture();
        fx.tabs.inner.open("https://example.com/party", "Party 😀");
        fx.tabs.inner.open("https://example.com/cake", "😀");

        // One scalar value, but two units, so it is long enough
        let mut ranker = fx.ranker;
        let results = ranker.search("😀").unwrap();

        let titles: Vec<&str> = results.iter().map(|r| r.title.as_str()).collect();
        assert_eq!(titles, vec!["😀", "Party 😀"]);
        assert_eq!(ranker.history().entries(), ["😀"]);
    }

    #[test]
    fn test_search_records_history() {
        let fx = fixture();
        let mut ranker = fx.ranker;

        ranker.search("  github ").unwrap();
        ranker.search("gitlab").unwrap();

        assert_eq!(ranker.suggestions("GIT"), vec!["gitlab", "github"]);
        assert_eq!(
            QueryHistory::load(fx.store.as_ref()).unwrap().entries(),
            ["gitlab", "github"]
        );

        let mut reloaded = SearchRanker::new(fx.tabs.clone(), fx.sessions.clone(), fx.store.clone());
        reloaded.load_history().unwrap();
        assert_eq!(reloaded.history(), ranker.history());
    }
}

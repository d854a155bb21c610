//! Recent query history

use serde::{Deserialize, Serialize};

use tabmind_storage::{JsonStoreExt, KeyValueStore};

use crate::ranker::{utf16_len, MIN_QUERY_LEN};
use crate::Result;

pub const HISTORY_KEY: &str = "search_history";

const MAX_ENTRIES: usize = 10;
const MAX_SUGGESTIONS: usize = 5;

/// Distinct queries, most recent first
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryHistory {
    entries: Vec<String>,
}

impl QueryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        Ok(store.get_json(HISTORY_KEY)?.unwrap_or_default())
    }

    pub fn persist(&self, store: &dyn KeyValueStore) -> Result<()> {
        store.set_json(HISTORY_KEY, self)?;
        Ok(())
    }

    /// Put a query at the front, dropping an older copy and the oldest
    /// entries past the cap. Returns false for blank queries.
    pub fn record(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        self.entries.retain(|q| q != query);
        self.entries.insert(0, query.to_string());
        self.entries.truncate(MAX_ENTRIES);
        true
    }

    /// Up to five recent queries containing `prefix`, newest first
    pub fn suggestions(&self, prefix: &str) -> Vec<String> {
        if utf16_len(prefix) < MIN_QUERY_LEN {
            return Vec::new();
        }

        let needle = prefix.to_lowercase();
        self.entries
            .iter()
            .filter(|q| q.to_lowercase().contains(&needle))
            .take(MAX_SUGGESTIONS)
            .cloned()
            .collect()
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabmind_storage::MemoryStore;

    #[test]
    fn test_record_dedups_and_caps() {
        let mut history = QueryHistory::new();
        for i in 0..12 {
            history.record(&format!("query {}", i));
        }
        assert_eq!(history.len(), 10);
        assert_eq!(history.entries()[0], "query 11");

        history.record(" query 5 ");
        assert_eq!(history.entries()[0], "query 5");
        assert_eq!(history.entries().iter().filter(|q| *q == "query 5").count(), 1);
        assert_eq!(history.len(), 10);

        assert!(!history.record("   "));
    }

    #[test]
    fn test_suggestions() {
        let mut history = QueryHistory::new();
        for q in ["rust docs", "Rustlings", "tokio", "rust book", "trust", "crust", "rusty"] {
            history.record(q);
        }

        assert_eq!(
            history.suggestions("RUST"),
            vec!["rusty", "crust", "trust", "rust book", "Rustlings"]
        );
        assert!(history.suggestions("r").is_empty());
        assert!(history.suggestions("python").is_empty());
    }

    #[test]
    fn test_suggestions_measure_utf16_units() {
        let mut history = QueryHistory::new();
        history.record("🎉 launch party");
        history.record("é clair");

        assert_eq!(history.suggestions("🎉"), vec!["🎉 launch party"]);
        assert!(history.suggestions("é").is_empty());
    }

    #[test]
    fn test_persist_and_load() {
        let store = MemoryStore::new();
        assert!(QueryHistory::load(&store).unwrap().is_empty());

        let mut history = QueryHistory::new();
        history.record("arxiv");
        history.persist(&store).unwrap();

        assert_eq!(store.get(HISTORY_KEY).unwrap().unwrap(), r#"["arxiv"]"#);
        assert_eq!(QueryHistory::load(&store).unwrap(), history);
    }
}

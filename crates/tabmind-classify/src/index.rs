//! Category Index
//!
//! Partition of tracked tab ids by category. A tab id appears in at most one
//! list. Membership is pruned lazily against the live tab set when a snapshot
//! is taken, and persisted as the `categories` section of the settings blob.

use std::collections::{BTreeMap, HashSet};

use tabmind_storage::{JsonStoreExt, KeyValueStore, SETTINGS_KEY};
use tabmind_tabs::{Tab, TabDirectory, TabId};

use crate::category::Category;
use crate::classifier::classify_or_general;
use crate::Result;

const CATEGORIES_SECTION: &str = "categories";

/// Persisted shape: category name to tab ids
type PersistedIndex = BTreeMap<String, Vec<TabId>>;

#[derive(Debug, Clone, Default)]
pub struct CategoryIndex {
    lists: BTreeMap<Category, Vec<TabId>>,
    dirty: bool,
}

impl CategoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the persisted partition. Unknown category names are dropped.
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        let persisted: PersistedIndex = store.read_section(SETTINGS_KEY, CATEGORIES_SECTION)?;
        let mut index = Self::new();

        for (name, ids) in persisted {
            match name.parse::<Category>() {
                Ok(category) => {
                    for id in ids {
                        index.assign(id, category);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "Ignoring persisted category"),
            }
        }

        index.dirty = false;
        Ok(index)
    }

    /// Write the partition into the settings blob, leaving other sections intact.
    pub fn persist(&mut self, store: &dyn KeyValueStore) -> Result<()> {
        let persisted: PersistedIndex = self
            .lists
            .iter()
            .map(|(category, ids)| (category.as_str().to_string(), ids.clone()))
            .collect();

        store.update_section(SETTINGS_KEY, CATEGORIES_SECTION, |section: &mut PersistedIndex| {
            *section = persisted;
        })?;

        self.dirty = false;
        Ok(())
    }

    /// Put a tab in `category`, removing it from any other list first.
    pub fn assign(&mut self, id: TabId, category: Category) {
        if self.assigned(id) == Some(category) {
            return;
        }

        self.remove(id);
        self.lists.entry(category).or_default().push(id);
        self.dirty = true;

        tracing::debug!(tab_id = %id, category = %category, "Assigned category");
    }

    pub fn remove(&mut self, id: TabId) -> Option<Category> {
        let category = self.assigned(id)?;
        if let Some(list) = self.lists.get_mut(&category) {
            list.retain(|t| *t != id);
        }
        self.dirty = true;
        Some(category)
    }

    /// Category a tab is recorded under, without classifying
    pub fn assigned(&self, id: TabId) -> Option<Category> {
        self.lists
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(category, _)| *category)
    }

    /// Category of a tab, classifying and recording it on first sight.
    ///
    /// Returns `None` when the tab no longer exists.
    pub fn category_of(
        &mut self,
        id: TabId,
        directory: &dyn TabDirectory,
    ) -> Result<Option<Category>> {
        if let Some(category) = self.assigned(id) {
            return Ok(Some(category));
        }

        let tab = match directory.get(id) {
            Ok(tab) => tab,
            Err(e) if e.is_transient() => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        Ok(Some(self.categorize(&tab)))
    }

    /// Recorded category of a tab already in hand, classifying it if unseen
    pub fn categorize(&mut self, tab: &Tab) -> Category {
        if let Some(category) = self.assigned(tab.id) {
            return category;
        }

        let category = classify_or_general(&tab.url, &tab.title);
        self.assign(tab.id, category);
        category
    }

    /// Every category with the ids of tabs that are still open.
    ///
    /// Ids of closed tabs are pruned from the index as a side effect.
    pub fn snapshot(
        &mut self,
        directory: &dyn TabDirectory,
    ) -> Result<BTreeMap<Category, Vec<TabId>>> {
        let live = directory.query()?;
        Ok(self.snapshot_of(&live))
    }

    /// [`snapshot`](Self::snapshot) against a tab list already in hand
    pub fn snapshot_of(&mut self, live: &[Tab]) -> BTreeMap<Category, Vec<TabId>> {
        let live: HashSet<TabId> = live.iter().map(|t| t.id).collect();

        let mut pruned = 0;
        for ids in self.lists.values_mut() {
            let before = ids.len();
            ids.retain(|id| live.contains(id));
            pruned += before - ids.len();
        }

        if pruned > 0 {
            self.dirty = true;
            tracing::debug!(pruned, "Pruned closed tabs from category index");
        }

        Category::ALL
            .iter()
            .map(|category| {
                let ids = self.lists.get(category).cloned().unwrap_or_default();
                (*category, ids)
            })
            .collect()
    }

    /// Whether the index changed since it was last loaded or persisted
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len(&self) -> usize {
        self.lists.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabmind_storage::MemoryStore;
    use tabmind_tabs::{TabError, TabManager};

    /// Directory whose host connection has dropped
    struct Disconnected;

    impl TabDirectory for Disconnected {
        fn query(&self) -> tabmind_tabs::Result<Vec<Tab>> {
            Err(TabError::Unavailable("port closed".to_string()))
        }

        fn get(&self, _id: TabId) -> tabmind_tabs::Result<Tab> {
            Err(TabError::Unavailable("port closed".to_string()))
        }

        fn navigate(&self, _id: TabId, _url: &str) -> tabmind_tabs::Result<Tab> {
            Err(TabError::Unavailable("port closed".to_string()))
        }

        fn create(&self, _url: &str, _active: bool) -> tabmind_tabs::Result<Tab> {
            Err(TabError::Unavailable("port closed".to_string()))
        }

        fn remove(&self, _id: TabId) -> tabmind_tabs::Result<()> {
            Err(TabError::Unavailable("port closed".to_string()))
        }
    }

    #[test]
    fn test_assign_moves_between_lists() {
        let mut index = CategoryIndex::new();
        index.assign(TabId(1), Category::Work);
        index.assign(TabId(1), Category::Research);

        assert_eq!(index.assigned(TabId(1)), Some(Category::Research));
        assert_eq!(index.len(), 1);

        assert_eq!(index.remove(TabId(1)), Some(Category::Research));
        assert_eq!(index.remove(TabId(1)), None);
        assert!(index.is_empty());
    }

    #[test]
    fn test_every_id_in_at_most_one_list() {
        let mut index = CategoryIndex::new();

        for step in 0..300u64 {
            let id = TabId(step * 7 % 23);
            let category = Category::ALL[(step * 5 % 6) as usize];
            index.assign(id, category);

            let mut seen = HashSet::new();
            for ids in index.lists.values() {
                for id in ids {
                    assert!(seen.insert(*id), "{} listed twice at step {}", id, step);
                }
            }
            assert_eq!(index.assigned(id), Some(category));
            assert_eq!(index.len(), seen.len());
        }

        // Every id 0..23 was assigned at some point
        assert_eq!(index.len(), 23);
    }

    #[test]
    fn test_unreachable_directory_yields_no_category() {
        let mut index = CategoryIndex::new();
        assert_eq!(index.category_of(TabId(4), &Disconnected).unwrap(), None);
        assert!(index.is_empty());

        assert!(index.snapshot(&Disconnected).is_err());
    }

    #[test]
    fn test_category_of_classifies_once() {
        let tabs = TabManager::new();
        let tab = tabs.open("https://github.com/rust-lang", "rust-lang");

        let mut index = CategoryIndex::new();
        assert_eq!(
            index.category_of(tab.id, &tabs).unwrap(),
            Some(Category::Work)
        );

        // A later navigation does not reclassify
        tabs.navigate(tab.id, "https://www.netflix.com").unwrap();
        assert_eq!(
            index.category_of(tab.id, &tabs).unwrap(),
            Some(Category::Work)
        );

        assert_eq!(index.category_of(TabId(99), &tabs).unwrap(), None);
    }

    #[test]
    fn test_snapshot_prunes_closed_tabs() {
        let tabs = TabManager::new();
        let kept = tabs.open("https://www.youtube.com", "YouTube");
        let closed = tabs.open("https://www.reddit.com", "Reddit");

        let mut index = CategoryIndex::new();
        index.assign(kept.id, Category::Entertainment);
        index.assign(closed.id, Category::Social);
        tabs.remove(closed.id).unwrap();

        let snapshot = index.snapshot(&tabs).unwrap();
        assert_eq!(snapshot.len(), Category::ALL.len());
        assert_eq!(snapshot[&Category::Entertainment], vec![kept.id]);
        assert!(snapshot[&Category::Social].is_empty());
        assert_eq!(index.assigned(closed.id), None);
    }

    #[test]
    fn test_snapshot_of_tab_list() {
        let tabs = TabManager::new();
        let open = tabs.open("https://www.amazon.com", "Cart");

        let mut index = CategoryIndex::new();
        index.assign(open.id, Category::Shopping);
        index.assign(TabId(500), Category::Work);

        let live = tabs.query().unwrap();
        let snapshot = index.snapshot_of(&live);
        assert_eq!(snapshot[&Category::Shopping], vec![open.id]);
        assert!(snapshot[&Category::Work].is_empty());
        assert!(index.is_dirty());
    }

    #[test]
    fn test_persist_keeps_other_sections() {
        let store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, r#"{"autoSuspend":false,"sessions":[]}"#)
            .unwrap();

        let mut index = CategoryIndex::new();
        index.assign(TabId(7), Category::Shopping);
        assert!(index.is_dirty());
        index.persist(&store).unwrap();
        assert!(!index.is_dirty());

        let blob: serde_json::Value = store.get_json(SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(blob["autoSuspend"], false);
        assert_eq!(blob["categories"]["Shopping"][0], 7);

        let loaded = CategoryIndex::load(&store).unwrap();
        assert_eq!(loaded.assigned(TabId(7)), Some(Category::Shopping));
        assert!(!loaded.is_dirty());
    }

    #[test]
    fn test_load_ignores_unknown_categories() {
        let store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, r#"{"categories":{"News":[1],"Work":[2]}}"#)
            .unwrap();

        let index = CategoryIndex::load(&store).unwrap();
        assert_eq!(index.assigned(TabId(1)), None);
        assert_eq!(index.assigned(TabId(2)), Some(Category::Work));
    }
}

//! Engine configuration and user settings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

use tabmind_storage::{JsonStoreExt, KeyValueStore, SETTINGS_KEY};
use tabmind_tabs::{SuspendPolicy, DEFAULT_ESSENTIAL_DOMAINS, DEFAULT_SUSPEND_DELAY_MINUTES};

use crate::Result;

/// Format version written into settings exports
pub const EXPORT_VERSION: &str = "1.0.0";

/// Process configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the database file
    pub database_path: PathBuf,
}

impl Config {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            database_path: data_dir.join("tabmind.db"),
        }
    }

    pub fn data_dir() -> PathBuf {
        dirs::data_local_dir()
            .map(|d| d.join("TabMind"))
            .unwrap_or_else(|| PathBuf::from(".tabmind"))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(Self::data_dir())
    }
}

/// User settings, stored as top-level fields of the settings blob next to
/// the `categories` and `sessions` sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Settings {
    pub auto_suspend: bool,
    /// Minutes a background tab stays idle before it is suspended
    pub suspend_delay: u64,
    pub essential_domains: Vec<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_suspend: true,
            suspend_delay: DEFAULT_SUSPEND_DELAY_MINUTES,
            essential_domains: DEFAULT_ESSENTIAL_DOMAINS
                .iter()
                .map(|d| d.to_string())
                .collect(),
        }
    }
}

/// Partial settings change; absent fields are left alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SettingsUpdate {
    pub auto_suspend: Option<bool>,
    pub suspend_delay: Option<u64>,
    pub essential_domains: Option<Vec<String>>,
}

impl Settings {
    /// Stored values merged over the defaults
    pub fn load(store: &dyn KeyValueStore) -> Result<Self> {
        Ok(store.get_json::<Settings>(SETTINGS_KEY)?.unwrap_or_default())
    }

    /// Write the defaults when no settings blob exists yet. Returns whether
    /// anything was written.
    pub fn ensure_initialized(store: &dyn KeyValueStore) -> Result<bool> {
        if store.get(SETTINGS_KEY)?.is_some() {
            return Ok(false);
        }

        let mut blob = to_object(&Settings::default())?;
        blob.insert("categories".to_string(), json!({}));
        blob.insert("sessions".to_string(), json!([]));
        store.set_json(SETTINGS_KEY, &Value::Object(blob))?;

        tracing::info!("Initialized default settings");
        Ok(true)
    }

    /// Merge these settings into the blob, keeping other sections
    pub fn save(&self, store: &dyn KeyValueStore) -> Result<()> {
        let fields = to_object(self)?;
        store.update_blob(SETTINGS_KEY, |blob| {
            blob.extend(fields);
        })?;
        Ok(())
    }

    pub fn apply(&mut self, update: SettingsUpdate) {
        if let Some(auto_suspend) = update.auto_suspend {
            self.auto_suspend = auto_suspend;
        }
        if let Some(delay) = update.suspend_delay {
            self.suspend_delay = delay;
        }
        if let Some(domains) = update.essential_domains {
            self.essential_domains = Vec::new();
            for domain in domains {
                self.add_essential_domain(&domain);
            }
        }
    }

    /// Returns false when the domain was already listed or is blank
    pub fn add_essential_domain(&mut self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        if domain.is_empty() || self.essential_domains.contains(&domain) {
            return false;
        }
        self.essential_domains.push(domain);
        true
    }

    pub fn remove_essential_domain(&mut self, domain: &str) -> bool {
        let domain = normalize_domain(domain);
        let before = self.essential_domains.len();
        self.essential_domains.retain(|d| *d != domain);
        self.essential_domains.len() != before
    }

    pub fn policy(&self) -> SuspendPolicy {
        SuspendPolicy {
            auto_suspend: self.auto_suspend,
            delay: Duration::from_secs(self.suspend_delay.saturating_mul(60)),
            essential_domains: self
                .essential_domains
                .iter()
                .cloned()
                .collect::<HashSet<_>>(),
        }
    }

    /// Pretty JSON document holding the whole settings blob, with the user
    /// settings filled in from defaults where missing.
    pub fn export(store: &dyn KeyValueStore, at: DateTime<Utc>) -> Result<String> {
        let mut blob = match store.get_json::<Value>(SETTINGS_KEY)? {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in to_object(&Settings::load(store)?)? {
            blob.insert(key, value);
        }

        let document = json!({
            "settings": blob,
            "exportDate": at.to_rfc3339(),
            "version": EXPORT_VERSION,
        });
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Replace the settings blob with the one inside an export document.
    ///
    /// Returns false, leaving the store untouched, when the document is not
    /// JSON or carries no `settings` object.
    pub fn import(store: &dyn KeyValueStore, document: &str) -> Result<bool> {
        let parsed: Value = match serde_json::from_str(document) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(error = %e, "Rejected settings import");
                return Ok(false);
            }
        };

        match parsed.get("settings") {
            Some(settings @ Value::Object(_)) => {
                store.set_json(SETTINGS_KEY, settings)?;
                tracing::info!("Imported settings");
                Ok(true)
            }
            _ => {
                tracing::warn!("Settings import has no settings object");
                Ok(false)
            }
        }
    }
}

fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

fn to_object<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(crate::CoreError::Config(format!(
            "expected a JSON object, got {}",
            other
        ))),
    }
}

// Platform data directory lookup
mod dirs {
    use std::path::PathBuf;

    pub fn data_local_dir() -> Option<PathBuf> {
        #[cfg(target_os = "windows")]
        {
            std::env::var("LOCALAPPDATA").ok().map(PathBuf::from)
        }
        #[cfg(target_os = "macos")]
        {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join("Library/Application Support"))
        }
        #[cfg(target_os = "linux")]
        {
            std::env::var("XDG_DATA_HOME")
                .ok()
                .map(PathBuf::from)
                .or_else(|| {
                    std::env::var("HOME")
                        .ok()
                        .map(|h| PathBuf::from(h).join(".local/share"))
                })
        }
        #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
        {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tabmind_storage::MemoryStore;

    #[test]
    fn test_config_paths() {
        let config = Config::new(PathBuf::from("/tmp/tabmind"));
        assert_eq!(config.database_path, PathBuf::from("/tmp/tabmind/tabmind.db"));
    }

    #[test]
    fn test_load_merges_over_defaults() {
        let store = MemoryStore::new();
        assert_eq!(Settings::load(&store).unwrap(), Settings::default());

        store
            .set(SETTINGS_KEY, r#"{"suspendDelay":5,"sessions":[]}"#)
            .unwrap();
        let settings = Settings::load(&store).unwrap();
        assert_eq!(settings.suspend_delay, 5);
        assert!(settings.auto_suspend);
        assert!(settings.essential_domains.contains(&"zoom.us".to_string()));
    }

    #[test]
    fn test_ensure_initialized_writes_once() {
        let store = MemoryStore::new();
        assert!(Settings::ensure_initialized(&store).unwrap());
        assert!(!Settings::ensure_initialized(&store).unwrap());

        let blob: Value = store.get_json(SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(blob["autoSuspend"], true);
        assert_eq!(blob["suspendDelay"], 30);
        assert_eq!(blob["categories"], json!({}));
        assert_eq!(blob["sessions"], json!([]));
    }

    #[test]
    fn test_save_keeps_sections() {
        let store = MemoryStore::new();
        store
            .set(SETTINGS_KEY, r#"{"sessions":[{"id":"1","name":"a","timestamp":1,"tabs":[]}]}"#)
            .unwrap();

        let mut settings = Settings::default();
        settings.apply(SettingsUpdate {
            auto_suspend: Some(false),
            ..Default::default()
        });
        settings.save(&store).unwrap();

        let blob: Value = store.get_json(SETTINGS_KEY).unwrap().unwrap();
        assert_eq!(blob["autoSuspend"], false);
        assert_eq!(blob["sessions"][0]["name"], "a");
    }

    #[test]
    fn test_essential_domains() {
        let mut settings = Settings::default();
        assert!(settings.add_essential_domain(" Calendar.Google.com "));
        assert!(!settings.add_essential_domain("calendar.google.com"));
        assert!(!settings.add_essential_domain("  "));
        assert!(settings.policy().is_essential("calendar.google.com"));

        assert!(settings.remove_essential_domain("zoom.us"));
        assert!(!settings.remove_essential_domain("zoom.us"));
        assert!(!settings.policy().is_essential("zoom.us"));
    }

    #[test]
    fn test_policy_delay_in_minutes() {
        let settings = Settings {
            suspend_delay: 45,
            ..Default::default()
        };
        assert_eq!(settings.policy().delay, Duration::from_secs(45 * 60));
    }

    #[test]
    fn test_export_import() {
        let store = MemoryStore::new();
        Settings::ensure_initialized(&store).unwrap();
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let exported = Settings::export(&store, at).unwrap();
        let document: Value = serde_json::from_str(&exported).unwrap();
        assert_eq!(document["version"], EXPORT_VERSION);
        assert_eq!(document["exportDate"], "2024-01-02T03:04:05+00:00");
        assert_eq!(document["settings"]["suspendDelay"], 30);

        let other = MemoryStore::new();
        assert!(Settings::import(&other, &exported).unwrap());
        assert_eq!(Settings::load(&other).unwrap(), Settings::default());

        assert!(!Settings::import(&other, "not json").unwrap());
        assert!(!Settings::import(&other, r#"{"version":"1.0.0"}"#).unwrap());
    }
}

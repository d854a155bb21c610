//! Session data structure

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use tabmind_tabs::{SuspendedSnapshot, Tab};

/// One tab as it was when the session was saved
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabSnapshot {
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub fav_icon_url: Option<String>,
}

impl From<&Tab> for TabSnapshot {
    fn from(tab: &Tab) -> Self {
        Self {
            url: tab.url.clone(),
            title: tab.title.clone(),
            fav_icon_url: tab.fav_icon_url.clone(),
        }
    }
}

impl From<SuspendedSnapshot> for TabSnapshot {
    fn from(snapshot: SuspendedSnapshot) -> Self {
        Self {
            url: snapshot.url,
            title: snapshot.title,
            fav_icon_url: snapshot.fav_icon_url,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Millisecond timestamp string, unique among saved sessions
    pub id: String,
    /// Human-readable name
    pub name: String,
    /// Milliseconds since the Unix epoch at save time
    pub timestamp: i64,
    /// Snapshots in tab enumeration order
    pub tabs: Vec<TabSnapshot>,
}

impl Session {
    /// Name used when the caller gives none
    pub fn default_name(at: DateTime<Utc>) -> String {
        format!("Session {}", at.format("%Y-%m-%d %H:%M:%S"))
    }

    pub fn saved_at(&self) -> Option<DateTime<Utc>> {
        Utc.timestamp_millis_opt(self.timestamp).single()
    }

    pub fn tab_count(&self) -> usize {
        self.tabs.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_name() {
        let at = Utc.with_ymd_and_hms(2024, 3, 9, 14, 5, 7).unwrap();
        assert_eq!(Session::default_name(at), "Session 2024-03-09 14:05:07");
    }

    #[test]
    fn test_wire_format() {
        let session: Session = serde_json::from_str(
            r#"{"id":"1700000000000","name":"Research","timestamp":1700000000000,
                "tabs":[{"url":"https://arxiv.org","title":"arXiv","favIconUrl":null}]}"#,
        )
        .unwrap();

        assert_eq!(session.tab_count(), 1);
        assert_eq!(
            session.saved_at().unwrap().timestamp_millis(),
            1_700_000_000_000
        );

        let json = serde_json::to_value(&session.tabs[0]).unwrap();
        assert!(json.get("favIconUrl").is_some());
    }
}

//! Command interface
//!
//! Requests from the popup or any other front end, tagged by `action`, and
//! the uniform `{success, data, error}` reply.

use serde::{Deserialize, Serialize};

use tabmind_tabs::TabId;

use crate::config::SettingsUpdate;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum Command {
    GetTabs,
    SaveSession {
        #[serde(default)]
        name: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    RestoreSession {
        session_id: String,
    },
    SearchTabs {
        query: String,
    },
    #[serde(rename_all = "camelCase")]
    SuspendTab {
        tab_id: TabId,
    },
    #[serde(rename_all = "camelCase")]
    CloseTab {
        tab_id: TabId,
    },
    ListSessions,
    GetSuggestions {
        prefix: String,
    },
    GetSettings,
    UpdateSettings {
        settings: SettingsUpdate,
    },
    GetIcon {
        url: String,
        #[serde(default)]
        title: String,
    },
}

impl Command {
    /// Every `action` tag the engine answers
    pub const ACTIONS: &'static [&'static str] = &[
        "getTabs",
        "saveSession",
        "restoreSession",
        "searchTabs",
        "suspendTab",
        "closeTab",
        "listSessions",
        "getSuggestions",
        "getSettings",
        "updateSettings",
        "getIcon",
    ];

    pub fn is_known_action(action: &str) -> bool {
        Self::ACTIONS.contains(&action)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> CommandResult<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Success with nothing to return
    pub fn done() -> Self {
        Self {
            success: true,
            data: None,
            error: None,
        }
    }

    pub fn err(error: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
        }
    }
}

//! Tab data structure
//!
//! A read-only view of a browser tab as reported by the host. The engine never
//! owns tabs; it keys its derived state (category, suspension) by [`TabId`].

use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

use crate::error::TabError;
use crate::Result;

/// URL prefixes of browser-internal pages. These are never categorized,
/// suspended or saved into sessions.
const INTERNAL_PREFIXES: &[&str] = &[
    "chrome://",
    "chrome-extension://",
    "edge://",
    "about:",
    "moz-extension://",
    "devtools://",
];

/// Opaque tab identifier, stable while the tab is open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TabId(pub u64);

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for TabId {
    fn from(id: u64) -> Self {
        TabId(id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tab {
    pub id: TabId,
    /// Current URL
    pub url: String,
    /// Page title
    #[serde(default)]
    pub title: String,
    /// Favicon URL if available
    #[serde(default)]
    pub fav_icon_url: Option<String>,
    /// Whether this tab is the focused tab
    #[serde(default)]
    pub active: bool,
}

impl Tab {
    pub fn new(id: TabId, url: impl Into<String>) -> Self {
        Self {
            id,
            url: url.into(),
            title: String::new(),
            fav_icon_url: None,
            active: false,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_favicon(mut self, fav_icon_url: impl Into<String>) -> Self {
        self.fav_icon_url = Some(fav_icon_url.into());
        self
    }

    /// Lowercased hostname of the tab's URL
    pub fn hostname(&self) -> Result<String> {
        hostname_of(&self.url)
    }

    pub fn is_internal(&self) -> bool {
        is_internal_url(&self.url)
    }

    /// Get display title (with fallback to URL)
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// Extract the lowercased hostname. URLs without a host (`file:///`, `data:`)
/// yield an empty hostname; only unparseable input is an error.
pub fn hostname_of(url: &str) -> Result<String> {
    let parsed = Url::parse(url).map_err(|_| TabError::InvalidUrl(url.to_string()))?;
    Ok(parsed.host_str().unwrap_or_default().to_lowercase())
}

pub fn is_internal_url(url: &str) -> bool {
    url.is_empty() || INTERNAL_PREFIXES.iter().any(|p| url.starts_with(p))
}

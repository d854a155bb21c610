//! Domain Classifier
//!
//! Rules are evaluated in fixed precedence order and the first match wins;
//! there is no scoring. A rule matches when the hostname contains one of its
//! domains, or when the lowercased URL or title contains one of its keywords.

use url::Url;

use crate::category::Category;
use crate::error::ClassifyError;
use crate::Result;

struct Rule {
    category: Category,
    /// Substrings matched against the hostname
    domains: &'static [&'static str],
    /// Substrings matched against the full URL and the title
    keywords: &'static [&'static str],
}

impl Rule {
    fn matches(&self, hostname: &str, url: &str, title: &str) -> bool {
        self.domains.iter().any(|d| hostname.contains(d))
            || self
                .keywords
                .iter()
                .any(|k| url.contains(k) || title.contains(k))
    }
}

const RULES: &[Rule] = &[
    Rule {
        category: Category::Work,
        domains: &[
            "gmail.com",
            "outlook.com",
            "slack.com",
            "teams.microsoft.com",
            "zoom.us",
            "meet.google.com",
            "notion.so",
            "monday.com",
            "asana.com",
            "trello.com",
            "github.com",
            "gitlab.com",
            "docs.google.com",
            "office.com",
            "sharepoint.com",
        ],
        keywords: &[
            "meeting",
            "calendar",
            "email",
            "project",
            "dashboard",
            "admin",
            "jira",
        ],
    },
    // Hostname only
    Rule {
        category: Category::Social,
        domains: &[
            "facebook.com",
            "twitter.com",
            "x.com",
            "instagram.com",
            "linkedin.com",
            "reddit.com",
            "discord.com",
            "telegram.org",
            "whatsapp.com",
            "snapchat.com",
            "tiktok.com",
        ],
        keywords: &[],
    },
    Rule {
        category: Category::Entertainment,
        domains: &[
            "youtube.com",
            "netflix.com",
            "spotify.com",
            "twitch.tv",
            "hulu.com",
            "disney.com",
            "primevideo.com",
            "hbomax.com",
            "music.apple.com",
            "soundcloud.com",
            "gaming.com",
        ],
        keywords: &["video", "music", "game"],
    },
    Rule {
        category: Category::Research,
        domains: &[
            "wikipedia.org",
            "scholar.google.com",
            "arxiv.org",
            "stackoverflow.com",
            "stackexchange.com",
            "quora.com",
            "medium.com",
            "dev.to",
            "coursera.org",
            "udemy.com",
            "khanacademy.org",
            "edx.org",
        ],
        keywords: &[
            "tutorial",
            "documentation",
            "docs",
            "api",
            "reference",
            "guide",
            "learn",
        ],
    },
    Rule {
        category: Category::Shopping,
        domains: &[
            "amazon.com",
            "ebay.com",
            "walmart.com",
            "target.com",
            "bestbuy.com",
            "shop",
            "store",
            "buy",
            "cart",
            "checkout",
        ],
        keywords: &["shop", "buy", "cart"],
    },
];

/// Classify a tab by URL and title.
///
/// Fails only when the URL cannot be parsed; callers fall back to
/// [`Category::General`] (see [`classify_or_general`]).
pub fn classify(url: &str, title: &str) -> Result<Category> {
    let parsed = Url::parse(url).map_err(|_| ClassifyError::InvalidUrl(url.to_string()))?;
    let hostname = parsed.host_str().unwrap_or_default().to_lowercase();

    Ok(classify_parts(
        &hostname,
        &url.to_lowercase(),
        &title.to_lowercase(),
    ))
}

pub fn classify_or_general(url: &str, title: &str) -> Category {
    match classify(url, title) {
        Ok(category) => category,
        Err(e) => {
            tracing::debug!(error = %e, "Falling back to General");
            Category::General
        }
    }
}

fn classify_parts(hostname: &str, url: &str, title: &str) -> Category {
    RULES
        .iter()
        .find(|rule| rule.matches(hostname, url, title))
        .map(|rule| rule.category)
        .unwrap_or(Category::General)
}

//! Thumbnail Synthesizer
//!
//! Deterministic fallback icons for tabs without a usable favicon. Well-known
//! sites have fixed brand icons; everything else gets its first letter on a
//! color hashed from the hostname, framed by a template picked from a coarse
//! keyword scan.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use url::Url;

/// Visual frame of an icon. Mirrors the categories, minus precedence rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IconTemplate {
    Work,
    Social,
    Entertainment,
    Research,
    Shopping,
    General,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum IconColor {
    Hex {
        value: String,
    },
    Hsl {
        hue: u32,
        saturation: u32,
        lightness: u32,
    },
}

impl IconColor {
    fn hex(value: &str) -> Self {
        IconColor::Hex {
            value: value.to_string(),
        }
    }
}

impl fmt::Display for IconColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IconColor::Hex { value } => write!(f, "{}", value),
            IconColor::Hsl {
                hue,
                saturation,
                lightness,
            } => write!(f, "hsl({}, {}%, {}%)", hue, saturation, lightness),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IconSpec {
    pub glyph: String,
    pub color: IconColor,
    pub template: IconTemplate,
}

impl IconSpec {
    /// Icon for URLs that cannot be parsed
    pub fn fallback() -> Self {
        Self {
            glyph: "?".to_string(),
            color: IconColor::hex("#6B7280"),
            template: IconTemplate::General,
        }
    }
}

struct KnownIcon {
    hostname: &'static str,
    color: &'static str,
    glyph: &'static str,
    template: IconTemplate,
}

const fn known(
    hostname: &'static str,
    color: &'static str,
    glyph: &'static str,
    template: IconTemplate,
) -> KnownIcon {
    KnownIcon {
        hostname,
        color,
        glyph,
        template,
    }
}

const KNOWN_ICONS: &[KnownIcon] = &[
    known("gmail.com", "#EA4335", "M", IconTemplate::Work),
    known("outlook.com", "#0078D4", "O", IconTemplate::Work),
    known("slack.com", "#4A154B", "S", IconTemplate::Work),
    known("teams.microsoft.com", "#6264A7", "T", IconTemplate::Work),
    known("zoom.us", "#2D8CFF", "Z", IconTemplate::Work),
    known("meet.google.com", "#00AC47", "M", IconTemplate::Work),
    known("github.com", "#24292f", "G", IconTemplate::Work),
    known("gitlab.com", "#FC6D26", "G", IconTemplate::Work),
    known("facebook.com", "#1877F2", "F", IconTemplate::Social),
    known("twitter.com", "#1DA1F2", "T", IconTemplate::Social),
    known("x.com", "#000000", "X", IconTemplate::Social),
    known("instagram.com", "#E4405F", "I", IconTemplate::Social),
    known("linkedin.com", "#0A66C2", "in", IconTemplate::Social),
    known("reddit.com", "#FF4500", "R", IconTemplate::Social),
    known("discord.com", "#5865F2", "D", IconTemplate::Social),
    known("youtube.com", "#FF0000", "▶", IconTemplate::Entertainment),
    known("netflix.com", "#E50914", "N", IconTemplate::Entertainment),
    known("spotify.com", "#1DB954", "♪", IconTemplate::Entertainment),
    known("twitch.tv", "#9146FF", "T", IconTemplate::Entertainment),
    known("music.youtube.com", "#FF6B35", "♫", IconTemplate::Entertainment),
    known("wikipedia.org", "#000000", "W", IconTemplate::Research),
    known("stackoverflow.com", "#F58025", "SO", IconTemplate::Research),
    known("developer.mozilla.org", "#000000", "MDN", IconTemplate::Research),
    known("docs.google.com", "#4285F4", "D", IconTemplate::Research),
    known("amazon.com", "#FF9900", "A", IconTemplate::Shopping),
    known("ebay.com", "#E53238", "E", IconTemplate::Shopping),
    known("walmart.com", "#0071CE", "W", IconTemplate::Shopping),
    known("target.com", "#CC0000", "◉", IconTemplate::Shopping),
];

// Scanned in order; the first set with a hit picks the template.
const TEMPLATE_KEYWORDS: &[(IconTemplate, &[&str])] = &[
    (
        IconTemplate::Work,
        &["mail", "docs", "drive", "office", "work", "business", "corp", "admin"],
    ),
    (
        IconTemplate::Social,
        &["social", "chat", "message", "friend", "community", "forum"],
    ),
    (
        IconTemplate::Entertainment,
        &["video", "music", "game", "stream", "watch", "play", "tv", "movie"],
    ),
    (
        IconTemplate::Research,
        &["wiki", "docs", "tutorial", "learn", "education", "reference", "api"],
    ),
    (
        IconTemplate::Shopping,
        &["shop", "store", "buy", "cart", "commerce", "market", "sale"],
    ),
];

/// Per-hostname icon cache for the life of the engine
#[derive(Debug, Default)]
pub struct ThumbnailSynthesizer {
    cache: HashMap<String, IconSpec>,
}

impl ThumbnailSynthesizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn icon_for(&mut self, url: &str, title: &str) -> IconSpec {
        let hostname = match Url::parse(url) {
            Ok(parsed) => parsed.host_str().unwrap_or_default().to_lowercase(),
            Err(_) => return IconSpec::fallback(),
        };
        let hostname = hostname
            .strip_prefix("www.")
            .unwrap_or(&hostname)
            .to_string();

        if let Some(icon) = self.cache.get(&hostname) {
            return icon.clone();
        }

        let icon = match KNOWN_ICONS.iter().find(|k| k.hostname == hostname) {
            Some(known) => IconSpec {
                glyph: known.glyph.to_string(),
                color: IconColor::hex(known.color),
                template: known.template,
            },
            None => synthesize(&hostname, title),
        };

        self.cache.insert(hostname, icon.clone());
        icon
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }
}

fn synthesize(hostname: &str, title: &str) -> IconSpec {
    let glyph = hostname
        .chars()
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_else(|| "?".to_string());

    IconSpec {
        glyph,
        color: color_for(hostname),
        template: template_for(hostname, title),
    }
}

/// Color derived from a polynomial hash over UTF-16 code units.
///
/// Only the shifted term is truncated to 32 bits; the running sum is not,
/// so long hostnames push the hash past the `i32` range.
pub(crate) fn color_for(hostname: &str) -> IconColor {
    let hash = hostname
        .encode_utf16()
        .fold(0i64, |h, unit| {
            i64::from(unit) + i64::from((h as i32).wrapping_shl(5)) - h
        })
        .unsigned_abs();

    let band = |modulus: u64| (hash % modulus) as u32;
    IconColor::Hsl {
        hue: band(360),
        saturation: 60 + band(40),
        lightness: 45 + band(20),
    }
}

pub(crate) fn template_for(hostname: &str, title: &str) -> IconTemplate {
    let text = format!("{} {}", hostname, title).to_lowercase();
    TEMPLATE_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(template, _)| *template)
        .unwrap_or(IconTemplate::General)
}

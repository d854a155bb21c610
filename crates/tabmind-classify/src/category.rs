//! Topical categories

use serde::{Deserialize, Serialize};

/// Closed set of categories. Declaration order is classifier precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Category {
    Work,
    Social,
    Entertainment,
    Research,
    Shopping,
    General,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Work,
        Category::Social,
        Category::Entertainment,
        Category::Research,
        Category::Shopping,
        Category::General,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Work => "Work",
            Category::Social => "Social",
            Category::Entertainment => "Entertainment",
            Category::Research => "Research",
            Category::Shopping => "Shopping",
            Category::General => "General",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("Unknown category: {}", s))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trip() {
        for category in Category::ALL {
            assert_eq!(category.as_str().parse::<Category>().unwrap(), category);
        }
        assert_eq!("research".parse::<Category>().unwrap(), Category::Research);
        assert!("News".parse::<Category>().is_err());
    }
}

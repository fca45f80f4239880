//! Static catalog of news categories and supported countries.

use serde::Serialize;

/// The category that maps to "no category filter" on the headlines API.
pub const DEFAULT_CATEGORY: &str = "general";
pub const DEFAULT_COUNTRY: &str = "us";

/// A selectable news topic
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Category {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Country {
    pub code: &'static str,
    pub name: &'static str,
}

pub const CATEGORIES: &[Category] = &[
    Category {
        id: "technology",
        name: "Technology",
        description: "Latest tech news, gadgets, AI, and innovation",
        icon: "laptop-code",
    },
    Category {
        id: "business",
        name: "Business",
        description: "Market updates, finance, and business strategies",
        icon: "briefcase",
    },
    Category {
        id: "science",
        name: "Science",
        description: "Scientific discoveries and research breakthroughs",
        icon: "microscope",
    },
    Category {
        id: "health",
        name: "Health",
        description: "Medical news, wellness tips, and health research",
        icon: "heartbeat",
    },
    Category {
        id: "sports",
        name: "Sports",
        description: "Sports news, scores, and athletic achievements",
        icon: "football-ball",
    },
    Category {
        id: "entertainment",
        name: "Entertainment",
        description: "Movies, music, celebrities, and pop culture",
        icon: "film",
    },
    Category {
        id: "general",
        name: "General",
        description: "Breaking news and current events worldwide",
        icon: "globe",
    },
];

pub const COUNTRIES: &[Country] = &[
    Country { code: "us", name: "United States" },
    Country { code: "gb", name: "United Kingdom" },
    Country { code: "ca", name: "Canada" },
    Country { code: "au", name: "Australia" },
    Country { code: "in", name: "India" },
    Country { code: "de", name: "Germany" },
    Country { code: "fr", name: "France" },
    Country { code: "jp", name: "Japan" },
];

pub fn category(id: &str) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.id == id)
}

/// Human-readable name for a topic id; unknown ids are shown as-is.
pub fn display_name(id: &str) -> String {
    category(id)
        .map(|c| c.name.to_string())
        .unwrap_or_else(|| id.to_string())
}

pub fn is_default_category(id: &str) -> bool {
    id == DEFAULT_CATEGORY
}

pub fn country(code: &str) -> Option<&'static Country> {
    COUNTRIES.iter().find(|c| c.code == code)
}

/// Country code to query with: a known code as given, anything else the default.
pub fn resolve_country(code: Option<&str>) -> &'static str {
    code.map(|c| c.trim().to_ascii_lowercase())
        .and_then(|c| country(&c))
        .map(|c| c.code)
        .unwrap_or(DEFAULT_COUNTRY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_and_unknown_display_names() {
        assert_eq!(display_name("technology"), "Technology");
        assert_eq!(display_name("invalidtopic"), "invalidtopic");
    }

    #[test]
    fn general_is_the_default_category() {
        assert!(is_default_category("general"));
        assert!(!is_default_category("science"));
        assert!(category(DEFAULT_CATEGORY).is_some());
    }

    #[test]
    fn country_lookup() {
        assert_eq!(country("jp").map(|c| c.name), Some("Japan"));
        assert!(country("zz").is_none());
    }

    #[test]
    fn unknown_or_missing_country_falls_back() {
        assert_eq!(resolve_country(Some("gb")), "gb");
        assert_eq!(resolve_country(Some(" FR ")), "fr");
        assert_eq!(resolve_country(Some("zz")), DEFAULT_COUNTRY);
        assert_eq!(resolve_country(None), DEFAULT_COUNTRY);
    }
}

//! Fixed content dimensions: categories, epochs, and languages.
//!
//! Every story is keyed by (category, epoch, language). The lists are fixed
//! at compile time; requests naming anything outside them are rejected at
//! the parse step.

use serde::{Deserialize, Serialize};

/// Topic tag partitioning story generation and caching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Technology,
    Science,
    Art,
    Nature,
    Sports,
    Music,
    Space,
    Innovation,
    Health,
    Education,
}

/// All categories served by the positive-news pipeline.
pub const ALL_CATEGORIES: [Category; 10] = [
    Category::Technology,
    Category::Science,
    Category::Art,
    Category::Nature,
    Category::Sports,
    Category::Music,
    Category::Space,
    Category::Innovation,
    Category::Health,
    Category::Education,
];

/// The subset of categories with historical-figure seed data.
pub const FIGURE_CATEGORIES: [Category; 8] = [
    Category::Technology,
    Category::Science,
    Category::Art,
    Category::Nature,
    Category::Sports,
    Category::Music,
    Category::Space,
    Category::Innovation,
];

impl Category {
    /// SQL- and URL-compatible string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Technology => "Technology",
            Self::Science => "Science",
            Self::Art => "Art",
            Self::Nature => "Nature",
            Self::Sports => "Sports",
            Self::Music => "Music",
            Self::Space => "Space",
            Self::Innovation => "Innovation",
            Self::Health => "Health",
            Self::Education => "Education",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_CATEGORIES
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown category: {s}"))
    }
}

/// Historical era used to flavor generated content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Epoch {
    Ancient,
    Medieval,
    Industrial,
    Modern,
    Future,
}

/// All epochs, oldest first.
pub const ALL_EPOCHS: [Epoch; 5] = [
    Epoch::Ancient,
    Epoch::Medieval,
    Epoch::Industrial,
    Epoch::Modern,
    Epoch::Future,
];

impl Epoch {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ancient => "Ancient",
            Self::Medieval => "Medieval",
            Self::Industrial => "Industrial",
            Self::Modern => "Modern",
            Self::Future => "Future",
        }
    }
}

impl std::fmt::Display for Epoch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Epoch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_EPOCHS
            .iter()
            .find(|e| e.as_str().eq_ignore_ascii_case(s))
            .copied()
            .ok_or_else(|| format!("unknown epoch: {s}"))
    }
}

/// Story language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Es,
}

/// All supported languages.
pub const ALL_LANGUAGES: [Language; 2] = [Language::En, Language::Es];

impl Language {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Es => "es",
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" | "EN" => Ok(Self::En),
            "es" | "ES" => Ok(Self::Es),
            _ => Err(format!("unknown language: {s}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_roundtrip() {
        for category in ALL_CATEGORIES {
            let parsed: Category = category.as_str().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("Gardening".parse::<Category>().is_err());
    }

    #[test]
    fn category_parse_is_case_insensitive() {
        assert_eq!("technology".parse::<Category>().unwrap(), Category::Technology);
        assert_eq!("SPACE".parse::<Category>().unwrap(), Category::Space);
    }

    #[test]
    fn epoch_roundtrip() {
        for epoch in ALL_EPOCHS {
            let parsed: Epoch = epoch.as_str().parse().unwrap();
            assert_eq!(parsed, epoch);
        }
        assert!("Renaissance".parse::<Epoch>().is_err());
    }

    #[test]
    fn language_roundtrip() {
        assert_eq!("en".parse::<Language>().unwrap(), Language::En);
        assert_eq!("es".parse::<Language>().unwrap(), Language::Es);
        assert!("fr".parse::<Language>().is_err());
    }

    #[test]
    fn figure_categories_are_subset() {
        for category in FIGURE_CATEGORIES {
            assert!(ALL_CATEGORIES.contains(&category));
        }
    }
}

//! Menu categories and the category filter.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Menu category a product belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Coffee,
    Pastries,
    Sandwiches,
    Tea,
}

impl Category {
    /// All categories in menu order.
    pub const ALL: [Self; 4] = [Self::Coffee, Self::Pastries, Self::Sandwiches, Self::Tea];

    /// Lowercase name used in URLs and serialized data.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Coffee => "coffee",
            Self::Pastries => "pastries",
            Self::Sandwiches => "sandwiches",
            Self::Tea => "tea",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Coffee => "Coffee",
            Self::Pastries => "Pastries",
            Self::Sandwiches => "Sandwiches",
            Self::Tea => "Tea",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The category selection applied to the menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryFilter {
    /// Show the whole catalog.
    #[default]
    All,
    /// Show a single category.
    Only(Category),
}

impl CategoryFilter {
    /// Every filter choice, in the order the filter bar shows them.
    pub const CHOICES: [Self; 5] = [
        Self::All,
        Self::Only(Category::Coffee),
        Self::Only(Category::Pastries),
        Self::Only(Category::Sandwiches),
        Self::Only(Category::Tea),
    ];

    /// Whether a product in `category` passes this filter.
    #[must_use]
    pub fn matches(&self, category: Category) -> bool {
        match self {
            Self::All => true,
            Self::Only(selected) => *selected == category,
        }
    }

    /// Lowercase name used in URLs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Only(category) => category.as_str(),
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::All => "All",
            Self::Only(category) => category.label(),
        }
    }
}

impl fmt::Display for CategoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A category name that is not on the menu.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown category: {0}")]
pub struct CategoryParseError(pub String);

impl FromStr for Category {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| CategoryParseError(s.to_string()))
    }
}

impl FromStr for CategoryFilter {
    type Err = CategoryParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "all" {
            return Ok(Self::All);
        }
        s.parse::<Category>().map(Self::Only)
    }
}

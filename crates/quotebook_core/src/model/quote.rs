//! Quote record model.
//!
//! # Responsibility
//! - Define the `{ text, category }` record and its validation errors.
//! - Normalize user/imported/remote input into one canonical shape.
//!
//! # Invariants
//! - `text` is trimmed with internal whitespace runs collapsed to one space.
//! - `category` follows the same rule and is additionally lower-cased, so
//!   category equality is exact on the stored form.
//! - Records are immutable once created; fields are only readable.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));

/// Sentinel filter value that matches every category.
pub const ALL_CATEGORIES: &str = "all";

/// Validation failures for quote input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteValidationError {
    /// `text` is empty after trimming.
    EmptyText,
    /// `category` is empty after trimming.
    EmptyCategory,
}

impl QuoteValidationError {
    /// Stable machine-readable code for logs and shells.
    pub fn code(&self) -> &'static str {
        match self {
            Self::EmptyText => "quote_text_empty",
            Self::EmptyCategory => "quote_category_empty",
        }
    }
}

impl Display for QuoteValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyText => write!(f, "quote text must not be empty"),
            Self::EmptyCategory => write!(f, "quote category must not be empty"),
        }
    }
}

impl Error for QuoteValidationError {}

/// One quote record, the atomic unit of content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Quote {
    text: String,
    category: String,
}

impl Quote {
    /// Creates a normalized quote record.
    ///
    /// # Errors
    /// - `EmptyText` when `text` is blank.
    /// - `EmptyCategory` when `category` is blank.
    pub fn new(
        text: impl AsRef<str>,
        category: impl AsRef<str>,
    ) -> Result<Self, QuoteValidationError> {
        let text = normalize_text(text.as_ref()).ok_or(QuoteValidationError::EmptyText)?;
        let category =
            normalize_category(category.as_ref()).ok_or(QuoteValidationError::EmptyCategory)?;
        Ok(Self { text, category })
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Returns whether this record passes the given filter value.
    ///
    /// `filter` is compared after normalization; `all` matches everything.
    pub fn matches_filter(&self, filter: &str) -> bool {
        filter == ALL_CATEGORIES || self.category == filter
    }
}

// Deserialization funnels through `Quote::new` so stored or imported data can
// never bypass normalization.
impl<'de> Deserialize<'de> for Quote {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawQuote {
            text: String,
            category: String,
        }

        let raw = RawQuote::deserialize(deserializer)?;
        Quote::new(raw.text, raw.category).map_err(serde::de::Error::custom)
    }
}

/// Normalizes quote text. Returns `None` for blank input.
pub fn normalize_text(value: &str) -> Option<String> {
    let collapsed = WHITESPACE_RE.replace_all(value.trim(), " ");
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed.into_owned())
    }
}

/// Normalizes a category or filter value. Returns `None` for blank input.
pub fn normalize_category(value: &str) -> Option<String> {
    normalize_text(value).map(|value| value.to_lowercase())
}

/// Display label for a category value.
///
/// - `all` -> `All Categories`
/// - otherwise the first character is upper-cased.
pub fn category_label(category: &str) -> String {
    if category == ALL_CATEGORIES {
        return "All Categories".to_string();
    }
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Built-in quotes seeded into an empty store.
pub fn default_quotes() -> Vec<Quote> {
    const DEFAULTS: &[(&str, &str)] = &[
        (
            "The only way to do great work is to love what you do.",
            "work",
        ),
        (
            "Life is what happens when you're busy making other plans.",
            "life",
        ),
        ("In the middle of difficulty lies opportunity.", "inspiration"),
        ("Simplicity is the ultimate sophistication.", "wisdom"),
        ("Stay hungry, stay foolish.", "motivation"),
        ("Nothing lasts for ever, both good and bad.", "mystery"),
    ];

    DEFAULTS
        .iter()
        .map(|(text, category)| Quote {
            text: (*text).to_string(),
            category: (*category).to_string(),
        })
        .collect()
}

//! Category index derived from the quote collection.
//!
//! # Invariants
//! - `all` is always the first entry and appears exactly once.
//! - Remaining entries are distinct, in first-seen collection order.
//! - The index is never persisted; only the selected filter is.

use crate::model::quote::{normalize_category, Quote, ALL_CATEGORIES};
use std::collections::HashSet;

/// Lazy, restartable iterator over distinct categories.
///
/// Clone it (or call [`distinct_categories`] again) to restart.
#[derive(Debug, Clone)]
pub struct DistinctCategories<'a> {
    quotes: std::slice::Iter<'a, Quote>,
    seen: HashSet<&'a str>,
    emitted_all: bool,
}

impl<'a> Iterator for DistinctCategories<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.emitted_all {
            self.emitted_all = true;
            return Some(ALL_CATEGORIES);
        }
        for quote in self.quotes.by_ref() {
            let category = quote.category();
            if category != ALL_CATEGORIES && self.seen.insert(category) {
                return Some(category);
            }
        }
        None
    }
}

/// Yields `all` followed by each distinct category in first-seen order.
pub fn distinct_categories(quotes: &[Quote]) -> DistinctCategories<'_> {
    DistinctCategories {
        quotes: quotes.iter(),
        seen: HashSet::new(),
        emitted_all: false,
    }
}

/// Materialized category index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryIndex {
    categories: Vec<String>,
}

impl CategoryIndex {
    /// Recomputes the index in O(n).
    pub fn build(quotes: &[Quote]) -> Self {
        Self {
            categories: distinct_categories(quotes).map(str::to_string).collect(),
        }
    }

    pub fn contains(&self, category: &str) -> bool {
        self.categories.iter().any(|value| value == category)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.categories.iter().map(String::as_str)
    }

    /// Number of entries, including `all`.
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    /// Always false: the sentinel is present even for an empty collection.
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }
}

/// Returns the normalized `requested` filter if indexed, else `all`.
pub fn resolve_filter(requested: &str, index: &CategoryIndex) -> String {
    match normalize_category(requested) {
        Some(normalized) if index.contains(&normalized) => normalized,
        _ => ALL_CATEGORIES.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::{distinct_categories, resolve_filter, CategoryIndex};
    use crate::model::quote::Quote;

    fn quote(text: &str, category: &str) -> Quote {
        Quote::new(text, category).unwrap()
    }

    #[test]
    fn iterator_is_restartable_via_clone() {
        let quotes = vec![quote("a", "x"), quote("b", "y")];
        let iter = distinct_categories(&quotes);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first, vec!["all", "x", "y"]);
    }

    #[test]
    fn literal_all_category_is_not_duplicated() {
        let quotes = vec![quote("a", "All"), quote("b", "x")];
        let categories: Vec<_> = distinct_categories(&quotes).collect();
        assert_eq!(categories, vec!["all", "x"]);
    }

    #[test]
    fn resolve_normalizes_requested_case() {
        let index = CategoryIndex::build(&[quote("a", "wisdom")]);
        assert_eq!(resolve_filter(" Wisdom ", &index), "wisdom");
        assert_eq!(resolve_filter("", &index), "all");
    }
}

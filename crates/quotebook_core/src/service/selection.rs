//! Random quote selection policy.
//!
//! The policy is stateless and memoryless: repeats across picks are allowed.

use crate::model::quote::{normalize_category, Quote, ALL_CATEGORIES};
use rand::Rng;

/// Source of uniform random indices, injected by callers.
pub trait RandomSource {
    /// Returns an index in `0..len`. Only called with `len > 0`.
    fn pick_index(&mut self, len: usize) -> usize;
}

/// Default source backed by the thread-local generator.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick_index(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// Result of one pick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
    Quote(Quote),
    /// No record matches the filter. Rendered distinctly by the shell.
    Empty,
}

impl Selection {
    pub fn quote(&self) -> Option<&Quote> {
        match self {
            Self::Quote(quote) => Some(quote),
            Self::Empty => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

/// Picks one record passing `filter` uniformly at random.
///
/// `filter` is normalized like stored categories; a blank filter means `all`.
/// Out-of-range indices from a custom source wrap modulo the subset size.
pub fn pick_quote(quotes: &[Quote], filter: &str, rng: &mut dyn RandomSource) -> Selection {
    let filter = normalize_category(filter).unwrap_or_else(|| ALL_CATEGORIES.to_string());
    let pool: Vec<&Quote> = quotes
        .iter()
        .filter(|quote| quote.matches_filter(&filter))
        .collect();
    if pool.is_empty() {
        return Selection::Empty;
    }
    let index = rng.pick_index(pool.len()) % pool.len();
    Selection::Quote(pool[index].clone())
}

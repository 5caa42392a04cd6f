//! Merge strategies applied when folding a remote snapshot into local state.

use crate::model::quote::Quote;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// How a fetched remote collection combines with the local one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MergeStrategy {
    /// Server wins: the remote collection replaces local state entirely.
    #[default]
    Overwrite,
    /// Keep local records; append remote records whose text is not present
    /// locally. Duplicates within the remote batch are appended once.
    AppendNewOnly,
}

impl MergeStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Overwrite => "overwrite",
            Self::AppendNewOnly => "append_new_only",
        }
    }

    /// Produces the collection that replaces local state.
    pub fn merge(&self, local: &[Quote], remote: Vec<Quote>) -> Vec<Quote> {
        match self {
            Self::Overwrite => remote,
            Self::AppendNewOnly => {
                let mut seen: HashSet<String> =
                    local.iter().map(|quote| quote.text().to_string()).collect();
                let mut merged = local.to_vec();
                for quote in remote {
                    if seen.insert(quote.text().to_string()) {
                        merged.push(quote);
                    }
                }
                merged
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MergeStrategy;
    use crate::model::quote::Quote;

    fn quote(text: &str, category: &str) -> Quote {
        Quote::new(text, category).unwrap()
    }

    #[test]
    fn overwrite_discards_local() {
        let merged = MergeStrategy::Overwrite.merge(&[quote("A", "x")], vec![quote("C", "z")]);
        assert_eq!(merged, vec![quote("C", "z")]);
    }

    #[test]
    fn append_new_only_skips_known_text() {
        let local = vec![quote("A", "x"), quote("B", "y")];
        let remote = vec![quote("B", "server"), quote("C", "z"), quote("C", "z")];
        let merged = MergeStrategy::AppendNewOnly.merge(&local, remote);
        assert_eq!(merged, vec![quote("A", "x"), quote("B", "y"), quote("C", "z")]);
    }
}

//! Snapshot persistence for the quote collection and filter preference.
//!
//! # Responsibility
//! - Map the collection to key `quotes` (export document JSON).
//! - Map the selected filter to key `selectedCategory` (plain string).
//!
//! # Invariants
//! - A stored snapshot that fails to decode is reported, never half-loaded.

use crate::codec::json_document::{export_document, import_document};
use crate::model::quote::Quote;
use crate::repo::kv_repo::{KvRepository, RepoError, RepoResult};

pub const QUOTES_KEY: &str = "quotes";
pub const SELECTED_CATEGORY_KEY: &str = "selectedCategory";
/// Copy of an unreadable `quotes` value, kept for manual recovery.
pub const QUOTES_BACKUP_KEY: &str = "quotes.corrupt";

/// Typed view over a key-value repository.
pub struct SnapshotRepository<R: KvRepository> {
    kv: R,
}

impl<R: KvRepository> SnapshotRepository<R> {
    pub fn new(kv: R) -> Self {
        Self { kv }
    }

    /// Loads the persisted collection. `Ok(None)` when nothing was stored yet.
    pub fn load_quotes(&self) -> RepoResult<Option<Vec<Quote>>> {
        let Some(raw) = self.kv.get(QUOTES_KEY)? else {
            return Ok(None);
        };
        import_document(&raw)
            .map(Some)
            .map_err(|err| RepoError::InvalidData(format!("`{QUOTES_KEY}` snapshot: {err}")))
    }

    /// Overwrites the persisted collection.
    pub fn save_quotes(&mut self, quotes: &[Quote]) -> RepoResult<()> {
        self.kv.set(QUOTES_KEY, &export_document(quotes))
    }

    /// Copies the raw `quotes` value to `quotes.corrupt`, if one is stored.
    pub fn backup_raw_quotes(&mut self) -> RepoResult<()> {
        if let Some(raw) = self.kv.get(QUOTES_KEY)? {
            self.kv.set(QUOTES_BACKUP_KEY, &raw)?;
        }
        Ok(())
    }

    pub fn load_selected_category(&self) -> RepoResult<Option<String>> {
        self.kv.get(SELECTED_CATEGORY_KEY)
    }

    pub fn save_selected_category(&mut self, category: &str) -> RepoResult<()> {
        self.kv.set(SELECTED_CATEGORY_KEY, category)
    }

    /// Returns the underlying repository.
    pub fn into_inner(self) -> R {
        self.kv
    }
}

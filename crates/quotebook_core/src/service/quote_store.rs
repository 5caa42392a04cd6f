//! Quote store: the single owner of session state.
//!
//! # Responsibility
//! - Own the in-memory collection, the selected filter and the session cache.
//! - Persist a snapshot after every successful mutation.
//! - Keep the derived category index in step with the collection.
//!
//! # Invariants
//! - The collection only grows by append, or is replaced wholesale.
//! - A snapshot write follows each mutation before the index is recomputed;
//!   when the write fails the in-memory change is rolled back.
//! - A rejected batch (validation/format) changes nothing.

use crate::codec::json_document::{self, FormatError};
use crate::model::quote::{default_quotes, Quote, QuoteValidationError, ALL_CATEGORIES};
use crate::repo::kv_repo::{KvRepository, MemoryKvRepository, RepoError};
use crate::repo::snapshot_repo::SnapshotRepository;
use crate::service::category_index::{resolve_filter, CategoryIndex};
use crate::service::selection::{pick_quote, RandomSource, Selection};
use log::{error, info, warn};
use once_cell::unsync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Session cache key holding the last displayed quote text.
pub const LAST_QUOTE_KEY: &str = "lastQuote";

/// Error for store mutations.
#[derive(Debug)]
pub enum StoreError {
    Validation(QuoteValidationError),
    Format(FormatError),
    Repo(RepoError),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Validation(err) => err.code(),
            Self::Format(err) => err.code(),
            Self::Repo(err) => err.code(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Format(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "storage failure: {err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Format(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<QuoteValidationError> for StoreError {
    fn from(value: QuoteValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<FormatError> for StoreError {
    fn from(value: FormatError) -> Self {
        Self::Format(value)
    }
}

impl From<RepoError> for StoreError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Session-scoped key-value slot; cleared with the process.
pub type SessionCache = Box<dyn KvRepository + Send>;

/// Quote store over a persistent key-value repository.
pub struct QuoteStore<R: KvRepository> {
    quotes: Vec<Quote>,
    snapshot: SnapshotRepository<R>,
    selected: String,
    index: OnceCell<CategoryIndex>,
    session: SessionCache,
    snapshot_corrupt: bool,
}

impl<R: KvRepository> QuoteStore<R> {
    /// Loads the persisted snapshot, seeding defaults when none exists.
    ///
    /// # Side effects
    /// - First run persists the built-in defaults immediately.
    /// - A corrupt snapshot is logged, copied to `quotes.corrupt`, and
    ///   replaced by defaults in memory only. Mutations are refused until
    ///   [`QuoteStore::discard_corrupt_snapshot`] is called, so the stored
    ///   value is never overwritten implicitly.
    pub fn open(kv: R) -> StoreResult<Self> {
        Self::open_with_session(kv, Box::new(MemoryKvRepository::new()))
    }

    /// Same as [`QuoteStore::open`] with a caller-provided session cache.
    pub fn open_with_session(kv: R, session: SessionCache) -> StoreResult<Self> {
        let mut snapshot = SnapshotRepository::new(kv);
        let mut snapshot_corrupt = false;
        let quotes = match snapshot.load_quotes() {
            Ok(Some(quotes)) => {
                info!(
                    "event=store_load module=store status=ok source=snapshot count={}",
                    quotes.len()
                );
                quotes
            }
            Ok(None) => {
                let seeded = default_quotes();
                snapshot.save_quotes(&seeded)?;
                info!(
                    "event=store_load module=store status=ok source=defaults count={}",
                    seeded.len()
                );
                seeded
            }
            Err(RepoError::InvalidData(details)) => {
                error!(
                    "event=store_load module=store status=error error_code=repo_invalid_data error={details}"
                );
                if let Err(err) = snapshot.backup_raw_quotes() {
                    error!(
                        "event=snapshot_backup module=store status=error error_code={} error={}",
                        err.code(),
                        err
                    );
                }
                snapshot_corrupt = true;
                default_quotes()
            }
            Err(err) => return Err(err.into()),
        };
        let selected = snapshot
            .load_selected_category()?
            .unwrap_or_else(|| ALL_CATEGORIES.to_string());

        Ok(Self {
            quotes,
            snapshot,
            selected,
            index: OnceCell::new(),
            session,
            snapshot_corrupt,
        })
    }

    /// Read-only view of the collection in insertion order.
    pub fn all(&self) -> &[Quote] {
        &self.quotes
    }

    pub fn len(&self) -> usize {
        self.quotes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quotes.is_empty()
    }

    /// Whether the stored snapshot was unreadable at open and still blocks
    /// mutations.
    pub fn snapshot_is_corrupt(&self) -> bool {
        self.snapshot_corrupt
    }

    /// Accepts losing the unreadable snapshot; the next mutation overwrites
    /// it. The raw value stays under `quotes.corrupt`.
    pub fn discard_corrupt_snapshot(&mut self) {
        if self.snapshot_corrupt {
            warn!("event=snapshot_discard module=store status=ok");
        }
        self.snapshot_corrupt = false;
    }

    /// Validates and appends one record. Returns the new collection size.
    pub fn add(&mut self, text: &str, category: &str) -> StoreResult<usize> {
        let quote = Quote::new(text, category).inspect_err(|err| {
            warn!(
                "event=quote_add module=store status=error error_code={}",
                err.code()
            );
        })?;
        self.append_all(vec![quote])
    }

    /// Appends a validated batch. Returns the new collection size.
    pub fn append_all(&mut self, records: Vec<Quote>) -> StoreResult<usize> {
        self.ensure_snapshot_writable("quote_append")?;
        let previous_len = self.quotes.len();
        let added = records.len();
        self.quotes.extend(records);
        if let Err(err) = self.snapshot.save_quotes(&self.quotes) {
            self.quotes.truncate(previous_len);
            return Err(self.persist_failed("quote_append", err));
        }
        self.invalidate_index();
        info!(
            "event=quote_append module=store status=ok added={added} count={}",
            self.quotes.len()
        );
        Ok(self.quotes.len())
    }

    /// Replaces the whole collection. Returns the new collection size.
    pub fn replace_all(&mut self, records: Vec<Quote>) -> StoreResult<usize> {
        self.ensure_snapshot_writable("quote_replace")?;
        let previous = std::mem::replace(&mut self.quotes, records);
        if let Err(err) = self.snapshot.save_quotes(&self.quotes) {
            self.quotes = previous;
            return Err(self.persist_failed("quote_replace", err));
        }
        self.invalidate_index();
        info!(
            "event=quote_replace module=store status=ok previous_count={} count={}",
            previous.len(),
            self.quotes.len()
        );
        Ok(self.quotes.len())
    }

    /// Parses an import document and appends every record in it.
    ///
    /// Returns the number of imported records. A malformed document changes
    /// nothing.
    pub fn import_document(&mut self, raw: &str) -> StoreResult<usize> {
        let records = json_document::import_document(raw).inspect_err(|err| {
            warn!(
                "event=quote_import module=store status=error error_code={}",
                err.code()
            );
        })?;
        let imported = records.len();
        self.append_all(records)?;
        Ok(imported)
    }

    /// Serializes the collection as an export document.
    pub fn export_document(&self) -> String {
        json_document::export_document(&self.quotes)
    }

    /// Derived category index, recomputed lazily after mutations.
    pub fn categories(&self) -> &CategoryIndex {
        self.index.get_or_init(|| CategoryIndex::build(&self.quotes))
    }

    /// Persisted filter resolved against the current index.
    ///
    /// Falls back to `all` when the stored category no longer exists.
    pub fn selected_filter(&self) -> String {
        resolve_filter(&self.selected, self.categories())
    }

    /// Resolves and persists a filter selection. Returns the effective filter.
    pub fn select_category(&mut self, requested: &str) -> StoreResult<String> {
        let resolved = resolve_filter(requested, self.categories());
        self.snapshot.save_selected_category(&resolved)?;
        self.selected = resolved.clone();
        Ok(resolved)
    }

    /// Picks a quote for the current filter and remembers it for the session.
    pub fn pick_quote(&mut self, rng: &mut dyn RandomSource) -> Selection {
        let filter = self.selected_filter();
        let selection = pick_quote(&self.quotes, &filter, rng);
        if let Selection::Quote(quote) = &selection {
            if let Err(err) = self.session.set(LAST_QUOTE_KEY, quote.text()) {
                warn!(
                    "event=session_cache_write module=store status=error error_code={} error={}",
                    err.code(),
                    err
                );
            }
        }
        selection
    }

    /// Text of the last picked quote in this session, if any.
    pub fn last_shown_quote(&self) -> Option<String> {
        self.session.get(LAST_QUOTE_KEY).ok().flatten()
    }

    fn ensure_snapshot_writable(&self, event: &str) -> StoreResult<()> {
        if !self.snapshot_corrupt {
            return Ok(());
        }
        warn!(
            "event={event} module=store status=error error_code=repo_invalid_data reason=snapshot_corrupt"
        );
        Err(StoreError::Repo(RepoError::InvalidData(
            "stored snapshot is unreadable; discard it before changing quotes".to_string(),
        )))
    }

    fn invalidate_index(&mut self) {
        self.index.take();
    }

    fn persist_failed(&self, event: &str, err: RepoError) -> StoreError {
        error!(
            "event={event} module=store status=error error_code={} error={}",
            err.code(),
            err
        );
        StoreError::Repo(err)
    }
}

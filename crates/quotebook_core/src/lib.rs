//! Core quote store for Quotebook.
//! This crate owns the collection, its persistence, and remote reconciliation;
//! shells only call into it.

pub mod codec;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod sync;

pub use codec::json_document::{export_document, import_document, FormatError};
pub use config::{ConfigError, QuotebookConfig, SyncConfig};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::quote::{
    category_label, default_quotes, Quote, QuoteValidationError, ALL_CATEGORIES,
};
pub use repo::kv_repo::{
    KvRepository, MemoryKvRepository, RepoError, RepoResult, SqliteKvRepository,
};
pub use service::category_index::{distinct_categories, resolve_filter, CategoryIndex};
pub use service::quote_store::{QuoteStore, StoreError, StoreResult};
pub use service::selection::{pick_quote, RandomSource, Selection, ThreadRandom};
pub use sync::merge::MergeStrategy;
pub use sync::reconciler::{
    ReconcileOutcome, Reconciler, ReconcilerSettings, SharedStore, SyncReport, SyncState,
};
pub use sync::remote::{HttpRemoteSource, RemoteFormat, RemoteSource};
pub use sync::SyncError;

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

//! Remote mirror reconciliation.
//!
//! # Responsibility
//! - Fetch a remote quote collection through an abstract source.
//! - Fold it into the local store under a merge strategy.
//! - Run at most one reconciliation at a time, on demand or on a timer.
//!
//! # Invariants
//! - A failed fetch or decode leaves the store untouched and is reported once.
//! - No retry, no backoff: the next timer fire is the only follow-up.

use crate::codec::json_document::FormatError;
use crate::service::quote_store::StoreError;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Duration;

pub mod merge;
pub mod reconciler;
pub mod remote;

/// Reconciliation failure.
#[derive(Debug)]
pub enum SyncError {
    /// Network or HTTP-status failure.
    Transport(String),
    /// Fetch exceeded its time bound.
    Timeout(Duration),
    /// Remote payload is not a usable quote document.
    Format(FormatError),
    /// Local persistence of the reconciled collection failed.
    Store(StoreError),
}

impl SyncError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "sync_transport_failed",
            Self::Timeout(_) => "sync_timeout",
            Self::Format(err) => err.code(),
            Self::Store(err) => err.code(),
        }
    }
}

impl Display for SyncError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Transport(details) => write!(f, "remote fetch failed: {details}"),
            Self::Timeout(limit) => {
                write!(f, "remote fetch timed out after {} ms", limit.as_millis())
            }
            Self::Format(err) => write!(f, "remote document rejected: {err}"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl Error for SyncError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Format(err) => Some(err),
            Self::Store(err) => Some(err),
            Self::Transport(_) | Self::Timeout(_) => None,
        }
    }
}

impl From<FormatError> for SyncError {
    fn from(value: FormatError) -> Self {
        Self::Format(value)
    }
}

impl From<StoreError> for SyncError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

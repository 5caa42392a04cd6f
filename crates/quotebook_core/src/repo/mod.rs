//! Persistence layer behind the quote store.
//!
//! # Responsibility
//! - Define the key-value contract the store persists through.
//! - Isolate SQLite and snapshot encoding from store orchestration.

pub mod kv_repo;
pub mod snapshot_repo;

//! Import/export codec for quote documents.
//!
//! # Responsibility
//! - Serialize the collection into a transferable JSON document.
//! - Parse external JSON back into validated quote records.
//!
//! # Invariants
//! - A document is accepted whole or rejected whole; no partial batches.

pub mod json_document;

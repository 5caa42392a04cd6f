//! Domain model for the quote collection.
//!
//! # Responsibility
//! - Define the canonical quote record shared by every store path.
//! - Own the normalization rule applied when a record is created.
//!
//! # Invariants
//! - A `Quote` never holds empty `text` or `category`.
//! - Categories are stored in normalized (lower-case) form.

pub mod quote;

//! Store services consumed by shells and the reconciler.
//!
//! # Responsibility
//! - Orchestrate collection mutation, persistence and derived state.
//! - Keep shells decoupled from storage details.

pub mod category_index;
pub mod quote_store;
pub mod selection;

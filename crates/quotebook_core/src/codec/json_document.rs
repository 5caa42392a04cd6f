//! JSON export document format: an array of `{ "text", "category" }` objects
//! in collection order.
//!
//! Pretty-printing is cosmetic. Unknown extra fields on a record are ignored.

use crate::model::quote::{Quote, QuoteValidationError};
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Parse failures for import documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    /// Input is not JSON at all.
    InvalidJson(String),
    /// Top-level value is not an array.
    NotAnArray,
    /// One element is not a valid quote record.
    InvalidRecord { index: usize, reason: String },
}

impl FormatError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidJson(_) => "format_invalid_json",
            Self::NotAnArray => "format_not_array",
            Self::InvalidRecord { .. } => "format_invalid_record",
        }
    }
}

impl Display for FormatError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(details) => write!(f, "invalid JSON document: {details}"),
            Self::NotAnArray => write!(f, "JSON document is not an array"),
            Self::InvalidRecord { index, reason } => {
                write!(f, "invalid quote at index {index}: {reason}")
            }
        }
    }
}

impl Error for FormatError {}

/// Serializes records into the export document.
pub fn export_document(quotes: &[Quote]) -> String {
    // Vec<Quote> of plain strings cannot fail to serialize.
    serde_json::to_string_pretty(quotes).unwrap_or_else(|_| "[]".to_string())
}

/// Parses raw document text into validated records.
///
/// # Errors
/// - `InvalidJson` when `raw` does not parse.
/// - `NotAnArray` when the top level is not an array.
/// - `InvalidRecord` for the first element lacking a non-empty string
///   `text` or `category`.
pub fn import_document(raw: &str) -> Result<Vec<Quote>, FormatError> {
    let value: Value =
        serde_json::from_str(raw).map_err(|err| FormatError::InvalidJson(err.to_string()))?;
    records_from_value(&value)
}

/// Validates an already-parsed JSON value as a quote array.
pub fn records_from_value(value: &Value) -> Result<Vec<Quote>, FormatError> {
    let items = value.as_array().ok_or(FormatError::NotAnArray)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| record_from_value(index, item))
        .collect()
}

fn record_from_value(index: usize, item: &Value) -> Result<Quote, FormatError> {
    let text = string_field(index, item, "text")?;
    let category = string_field(index, item, "category")?;
    Quote::new(text, category).map_err(|err| invalid_record(index, err))
}

fn string_field<'v>(index: usize, item: &'v Value, field: &str) -> Result<&'v str, FormatError> {
    let object = item.as_object().ok_or_else(|| FormatError::InvalidRecord {
        index,
        reason: "element is not an object".to_string(),
    })?;
    object
        .get(field)
        .and_then(Value::as_str)
        .ok_or_else(|| FormatError::InvalidRecord {
            index,
            reason: format!("missing string field `{field}`"),
        })
}

fn invalid_record(index: usize, err: QuoteValidationError) -> FormatError {
    FormatError::InvalidRecord {
        index,
        reason: err.to_string(),
    }
}

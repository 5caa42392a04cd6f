//! Remote collection sources.
//!
//! # Invariants
//! - `fetch` returns parsed JSON or fails; it never touches local state.
//! - Transport failures and non-2xx responses map to `SyncError::Transport`.

use crate::codec::json_document::{records_from_value, FormatError};
use crate::model::quote::Quote;
use crate::sync::SyncError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Category assigned to records mapped from placeholder posts.
pub const POSTS_CATEGORY: &str = "server";

/// Asynchronous "given a URL, return parsed JSON" capability.
#[async_trait]
pub trait RemoteSource: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Value, SyncError>;
}

/// HTTP source over `reqwest`.
#[derive(Debug, Clone, Default)]
pub struct HttpRemoteSource {
    client: reqwest::Client,
}

impl HttpRemoteSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl RemoteSource for HttpRemoteSource {
    async fn fetch(&self, url: &str) -> Result<Value, SyncError> {
        let response = self
            .client
            .get(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        let response = response
            .error_for_status()
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        let body = response
            .text()
            .await
            .map_err(|err| SyncError::Transport(err.to_string()))?;
        serde_json::from_str(&body)
            .map_err(|err| SyncError::Format(FormatError::InvalidJson(err.to_string())))
    }
}

/// Shape of the remote payload.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemoteFormat {
    /// Array of `{ text, category }`, same as the export document.
    Quotes,
    /// Array of placeholder posts; `title` becomes the quote text.
    #[default]
    Posts,
}

impl RemoteFormat {
    /// Decodes a fetched payload into validated records, whole or not at all.
    pub fn decode(&self, value: &Value) -> Result<Vec<Quote>, FormatError> {
        match self {
            Self::Quotes => records_from_value(value),
            Self::Posts => posts_from_value(value),
        }
    }
}

fn posts_from_value(value: &Value) -> Result<Vec<Quote>, FormatError> {
    let items = value.as_array().ok_or(FormatError::NotAnArray)?;
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let title = item
                .get("title")
                .and_then(Value::as_str)
                .ok_or_else(|| FormatError::InvalidRecord {
                    index,
                    reason: "missing string field `title`".to_string(),
                })?;
            Quote::new(title, POSTS_CATEGORY).map_err(|err| FormatError::InvalidRecord {
                index,
                reason: err.to_string(),
            })
        })
        .collect()
}

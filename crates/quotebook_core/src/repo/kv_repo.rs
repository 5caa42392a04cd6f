//! Key-value repository contracts and implementations.
//!
//! # Responsibility
//! - Provide the minimal `get`/`set` capability the store depends on.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `set` overwrites any previous value for the same key.
//! - `SqliteKvRepository` refuses connections without the `kv_entries` table.

use crate::db::DbError;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Storage error for key-value persistence.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    MissingRequiredTable(&'static str),
    /// Stored value exists but cannot be decoded.
    InvalidData(String),
}

impl RepoError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Db(err) => err.code(),
            Self::MissingRequiredTable(_) => "repo_missing_table",
            Self::InvalidData(_) => "repo_invalid_data",
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::MissingRequiredTable(table) => write!(f, "required table missing: {table}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::MissingRequiredTable(_) | Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Host-provided key-value capability.
pub trait KvRepository {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    fn set(&mut self, key: &str, value: &str) -> RepoResult<()>;
}

/// SQLite-backed persistent key-value repository.
pub struct SqliteKvRepository {
    conn: Connection,
}

impl SqliteKvRepository {
    /// Wraps a migrated connection.
    pub fn try_new(conn: Connection) -> RepoResult<Self> {
        if !table_exists(&conn, "kv_entries")? {
            return Err(RepoError::MissingRequiredTable("kv_entries"));
        }
        Ok(Self { conn })
    }
}

impl KvRepository for SqliteKvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value, updated_at)
             VALUES (?1, ?2, (strftime('%s', 'now') * 1000))
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at;",
            params![key, value],
        )?;
        Ok(())
    }
}

/// In-memory key-value repository.
///
/// Cleared with the process; backs the session-scoped cache and tests.
#[derive(Debug, Default, Clone)]
pub struct MemoryKvRepository {
    entries: HashMap<String, String>,
}

impl MemoryKvRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KvRepository for MemoryKvRepository {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> RepoResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

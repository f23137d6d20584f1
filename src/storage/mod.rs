//! Storage module for persisting harvested movies
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - First-write-wins inserts keyed on the movie name
//! - Read access for statistics and tests

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::harvest::Record;

/// A movie row as persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    /// Store-assigned identifier
    pub id: i64,
    /// The harvested fields
    pub record: Record,
    /// RFC 3339 timestamp of the insert
    pub harvested_at: String,
}

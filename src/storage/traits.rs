//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::harvest::Record;
use crate::storage::StoredRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// The harvest pipeline writes through a single consumer, so implementations
/// need no internal locking. The backend itself must enforce uniqueness of
/// the record name.
pub trait Storage {
    /// Creates the movie table if it does not exist yet
    fn create_schema(&mut self) -> StorageResult<()>;

    /// Inserts a record unless one with the same name is already stored
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The record was written
    /// * `Ok(false)` - A record with this name exists; nothing changed
    fn upsert_record(&mut self, record: &Record) -> StorageResult<bool>;

    /// Gets a stored record by its name
    fn get_record_by_name(&self, name: &str) -> StorageResult<Option<StoredRecord>>;

    /// Gets every stored record in insertion order
    fn list_records(&self) -> StorageResult<Vec<StoredRecord>>;

    /// Counts stored records
    fn count_records(&self) -> StorageResult<u64>;
}

//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::harvest::Record;
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::StoredRecord;
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;

const SELECT_COLUMNS: &str =
    r#"SELECT id, name, released_year, rating, summary, directors, "cast", harvested_at FROM movies"#;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        let mut storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        let mut storage = Self { conn };
        storage.create_schema()?;
        Ok(storage)
    }
}

fn decode_list(raw: &str, column: usize) -> rusqlite::Result<Vec<String>> {
    serde_json::from_str(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn stored_from_row(row: &Row<'_>) -> rusqlite::Result<StoredRecord> {
    let directors: String = row.get(5)?;
    let cast: String = row.get(6)?;

    Ok(StoredRecord {
        id: row.get(0)?,
        record: Record {
            name: row.get(1)?,
            released_year: row.get(2)?,
            rating: row.get(3)?,
            summary: row.get(4)?,
            directors: decode_list(&directors, 5)?,
            cast: decode_list(&cast, 6)?,
        },
        harvested_at: row.get(7)?,
    })
}

impl Storage for SqliteStorage {
    fn create_schema(&mut self) -> StorageResult<()> {
        initialize_schema(&self.conn)?;
        Ok(())
    }

    fn upsert_record(&mut self, record: &Record) -> StorageResult<bool> {
        let directors = serde_json::to_string(&record.directors)?;
        let cast = serde_json::to_string(&record.cast)?;
        let now = Utc::now().to_rfc3339();

        let changed = self.conn.execute(
            r#"INSERT OR IGNORE INTO movies
               (name, released_year, rating, summary, directors, "cast", harvested_at)
               VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)"#,
            params![
                record.name,
                record.released_year,
                record.rating,
                record.summary,
                directors,
                cast,
                now
            ],
        )?;

        Ok(changed > 0)
    }

    fn get_record_by_name(&self, name: &str) -> StorageResult<Option<StoredRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} WHERE name = ?1", SELECT_COLUMNS))?;

        let record = stmt
            .query_row(params![name], stored_from_row)
            .optional()?;

        Ok(record)
    }

    fn list_records(&self) -> StorageResult<Vec<StoredRecord>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{} ORDER BY id ASC", SELECT_COLUMNS))?;

        let records = stmt
            .query_map([], stored_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }

    fn count_records(&self) -> StorageResult<u64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM movies", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

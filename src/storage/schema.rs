//! Database schema definitions
//!
//! This module contains the SQL schema for the Reel-Harvest database.

/// SQL schema for the database
///
/// `directors` and `cast` hold JSON arrays encoded as text.
pub const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS movies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL UNIQUE,
    released_year TEXT NOT NULL DEFAULT '',
    rating TEXT NOT NULL DEFAULT '',
    summary TEXT NOT NULL DEFAULT '',
    directors TEXT NOT NULL DEFAULT '[]',
    "cast" TEXT NOT NULL DEFAULT '[]',
    harvested_at TEXT NOT NULL
);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}

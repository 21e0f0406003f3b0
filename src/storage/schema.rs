//! Database schema definitions
//!
//! Every collection lives in one table keyed by `(collection, key)` so that
//! a primary-key range scan yields keys in ascending byte order.

/// SQL schema for a store file
pub const SCHEMA_SQL: &str = r#"
-- Ordered key-value items, one row per (collection, key)
CREATE TABLE IF NOT EXISTS items (
    collection TEXT NOT NULL,
    key BLOB NOT NULL,
    value BLOB NOT NULL,
    PRIMARY KEY (collection, key)
) WITHOUT ROWID;
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

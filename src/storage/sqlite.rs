//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Store trait.
//! Mutations are buffered in a transaction that is opened by the first write
//! and committed by [`Store::flush`].

use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Store, StorageError, StorageResult};
use crate::storage::Collection;
use rusqlite::{params, Connection, OpenFlags, OptionalExtension};
use std::path::Path;

/// SQLite store backend
pub struct SqliteStore {
    conn: Connection,
    in_transaction: bool,
    read_only: bool,
}

impl SqliteStore {
    /// Opens or creates a store file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the store file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStore)` - Successfully opened/created store
    /// * `Err(StorageError)` - Failed to open store
    pub fn new(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self {
            conn,
            in_transaction: false,
            read_only: false,
        })
    }

    /// Opens an existing store file for reading only
    ///
    /// Used for search shards, which may belong to a crawler that is still running.
    pub fn open_read_only(path: &Path) -> StorageResult<Self> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;

        Ok(Self {
            conn,
            in_transaction: false,
            read_only: true,
        })
    }

    /// Creates an in-memory store (for testing)
    #[cfg(test)]
    pub fn new_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self {
            conn,
            in_transaction: false,
            read_only: false,
        })
    }

    /// Returns true while mutations are waiting for a flush
    pub fn has_pending_writes(&self) -> bool {
        self.in_transaction
    }

    fn begin_if_needed(&mut self) -> StorageResult<()> {
        if !self.in_transaction {
            self.conn.execute_batch("BEGIN")?;
            self.in_transaction = true;
        }
        Ok(())
    }
}

impl Store for SqliteStore {
    fn get(&self, collection: Collection, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let mut stmt = self
            .conn
            .prepare_cached("SELECT value FROM items WHERE collection = ?1 AND key = ?2")?;

        let value = stmt
            .query_row(params![collection.name(), key], |row| row.get(0))
            .optional()?;

        Ok(value)
    }

    fn set(&mut self, collection: Collection, key: &[u8], value: &[u8]) -> StorageResult<()> {
        self.begin_if_needed()?;
        self.conn.execute(
            "INSERT OR REPLACE INTO items (collection, key, value) VALUES (?1, ?2, ?3)",
            params![collection.name(), key, value],
        )?;
        Ok(())
    }

    fn delete(&mut self, collection: Collection, key: &[u8]) -> StorageResult<bool> {
        self.begin_if_needed()?;
        let removed = self.conn.execute(
            "DELETE FROM items WHERE collection = ?1 AND key = ?2",
            params![collection.name(), key],
        )?;
        Ok(removed > 0)
    }

    fn visit_ascending(
        &self,
        collection: Collection,
        start_key: &[u8],
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> StorageResult<usize> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT key, value FROM items WHERE collection = ?1 AND key >= ?2 ORDER BY key ASC",
        )?;

        // Materialize first so the visit sees the collection as of scan start
        let snapshot = stmt
            .query_map(params![collection.name(), start_key], |row| {
                Ok((row.get::<_, Vec<u8>>(0)?, row.get::<_, Vec<u8>>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        let mut visited = 0;
        for (key, value) in &snapshot {
            visited += 1;
            if !visitor(key, value) {
                break;
            }
        }

        Ok(visited)
    }

    fn count(&self, collection: Collection) -> StorageResult<u64> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM items WHERE collection = ?1",
            params![collection.name()],
            |row| row.get(0),
        )?;
        Ok(count as u64)
    }

    fn flush(&mut self) -> StorageResult<()> {
        if self.in_transaction {
            self.conn.execute_batch("COMMIT")?;
            self.in_transaction = false;
        }

        if !self.read_only {
            self.conn
                .query_row("PRAGMA wal_checkpoint(TRUNCATE)", [], |_| Ok(()))?;
        }

        Ok(())
    }

    fn remove_collection(&mut self, collection: Collection) -> StorageResult<u64> {
        self.begin_if_needed()?;
        let removed = self.conn.execute(
            "DELETE FROM items WHERE collection = ?1",
            params![collection.name()],
        )?;
        Ok(removed as u64)
    }

    fn copy_to(&mut self, destination: &Path) -> StorageResult<()> {
        // VACUUM cannot run inside a transaction
        self.flush()?;

        let destination = destination.to_str().ok_or_else(|| {
            StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("destination path is not valid UTF-8: {}", destination.display()),
            ))
        })?;

        self.conn
            .execute("VACUUM INTO ?1", params![destination])?;
        Ok(())
    }
}

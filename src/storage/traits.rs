//! Storage traits and error types
//!
//! This module defines the trait interface for ordered key-value store
//! backends and associated error types.

use crate::storage::Collection;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to decode stored value: {0}")]
    Codec(String),

    #[error("Store lock poisoned by a panicked writer")]
    Poisoned,

    #[error("Unknown collection: {0}")]
    UnknownCollection(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for ordered key-value store implementations
///
/// Keys are byte strings ordered bytewise within each collection. Mutations
/// may be buffered until [`Store::flush`] makes them durable.
pub trait Store {
    /// Gets the value stored under `key`, if any
    fn get(&self, collection: Collection, key: &[u8]) -> StorageResult<Option<Vec<u8>>>;

    /// Inserts or replaces the value stored under `key`
    fn set(&mut self, collection: Collection, key: &[u8], value: &[u8]) -> StorageResult<()>;

    /// Removes `key`, returning whether it was present
    fn delete(&mut self, collection: Collection, key: &[u8]) -> StorageResult<bool>;

    /// Visits entries with keys `>= start_key` in ascending key order
    ///
    /// The visitor returns `false` to stop early. The visit runs over a
    /// snapshot taken when the scan starts.
    ///
    /// # Returns
    ///
    /// The number of entries visited
    fn visit_ascending(
        &self,
        collection: Collection,
        start_key: &[u8],
        visitor: &mut dyn FnMut(&[u8], &[u8]) -> bool,
    ) -> StorageResult<usize>;

    /// Counts the entries of a collection
    fn count(&self, collection: Collection) -> StorageResult<u64>;

    /// Makes every buffered mutation durable
    fn flush(&mut self) -> StorageResult<()>;

    /// Removes every entry of a collection
    fn remove_collection(&mut self, collection: Collection) -> StorageResult<u64>;

    /// Writes a compacted copy of the whole store to `destination`
    fn copy_to(&mut self, destination: &Path) -> StorageResult<()>;
}

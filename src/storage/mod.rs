//! Storage module for persisting crawl data
//!
//! This module handles all store operations for the crawler, including:
//! - Ordered key-value collections backed by one SQLite file per shard
//! - Buffered writes made durable by an explicit flush
//! - The single-writer handle shared by the processor and the checkpoint task

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStore;
pub use traits::{Store, StorageError, StorageResult};

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex, MutexGuard};

/// The named collections kept in every store file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    /// Canonical URLs pending a fetch
    Frontier,
    /// Canonical URL -> Unix timestamp of the last crawl attempt
    Log,
    /// Term -> ordered set of canonical URLs
    Index,
    /// Canonical URL -> page title
    Title,
    /// Canonical URL -> meta description
    Meta,
}

impl Collection {
    /// Every collection, in listing order
    pub const ALL: [Collection; 5] = [
        Self::Frontier,
        Self::Log,
        Self::Index,
        Self::Title,
        Self::Meta,
    ];

    /// Returns the on-disk name of the collection
    pub fn name(&self) -> &'static str {
        match self {
            Self::Frontier => "scan-queue",
            Self::Log => "scan-log",
            Self::Index => "keyword-index",
            Self::Title => "title",
            Self::Meta => "meta",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Collection {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scan-queue" | "frontier" => Ok(Self::Frontier),
            "scan-log" | "log" => Ok(Self::Log),
            "keyword-index" | "index" => Ok(Self::Index),
            "title" => Ok(Self::Title),
            "meta" => Ok(Self::Meta),
            other => Err(StorageError::UnknownCollection(other.to_string())),
        }
    }
}

/// Reads a UTF-8 value from a store
pub fn get_text(
    store: &dyn Store,
    collection: Collection,
    key: &str,
) -> StorageResult<Option<String>> {
    store
        .get(collection, key.as_bytes())?
        .map(|bytes| {
            String::from_utf8(bytes).map_err(|e| StorageError::Codec(e.to_string()))
        })
        .transpose()
}

/// Opens or creates the crawler's store file
///
/// # Arguments
///
/// * `path` - Path to the store file
///
/// # Returns
///
/// * `Ok(SqliteStore)` - Successfully opened store
/// * `Err(StorageError)` - Failed to open or create the store
pub fn open_store(path: &Path) -> StorageResult<SqliteStore> {
    SqliteStore::new(path)
}

/// Exclusive-writer handle to the crawler's store
///
/// Every mutation and every flush happens while holding the lock, so a
/// checkpoint never observes a half-applied store call.
#[derive(Clone)]
pub struct SharedStore {
    inner: Arc<Mutex<SqliteStore>>,
}

impl SharedStore {
    /// Wraps a store for sharing between the processor and the checkpoint task
    pub fn new(store: SqliteStore) -> Self {
        Self {
            inner: Arc::new(Mutex::new(store)),
        }
    }

    /// Acquires exclusive access to the store
    pub fn lock(&self) -> StorageResult<MutexGuard<'_, SqliteStore>> {
        self.inner.lock().map_err(|_| StorageError::Poisoned)
    }

    /// Flushes buffered writes while holding exclusive access
    pub fn checkpoint(&self) -> StorageResult<()> {
        let mut store = self.lock()?;
        if store.has_pending_writes() {
            tracing::debug!("Checkpoint: flushing store");
        }
        store.flush()
    }
}

//! Shard discovery
//!
//! A shard is any store file in the shard directory carrying the shard
//! extension. Shards are opened read-only so search can run next to a live
//! crawler.

use crate::storage::{SqliteStore, StorageResult};
use std::path::{Path, PathBuf};

/// Lists shard files in `directory`, sorted by path
///
/// # Arguments
///
/// * `directory` - Directory to scan (not recursive)
/// * `extension` - Shard file extension, without the dot
pub fn discover_shards(directory: &Path, extension: &str) -> std::io::Result<Vec<PathBuf>> {
    let mut shards = Vec::new();

    for entry in std::fs::read_dir(directory)? {
        let path = entry?.path();
        let matches = path.is_file()
            && path
                .extension()
                .map_or(false, |ext| ext.eq_ignore_ascii_case(extension));
        if matches {
            shards.push(path);
        }
    }

    shards.sort();
    Ok(shards)
}

/// Opens every shard in `directory`
///
/// Files that cannot be opened as a store are skipped with a warning.
pub fn open_shards(directory: &Path, extension: &str) -> StorageResult<Vec<SqliteStore>> {
    let mut opened = Vec::new();

    for path in discover_shards(directory, extension)? {
        match SqliteStore::open_read_only(&path) {
            Ok(store) => {
                tracing::debug!("Opened shard {}", path.display());
                opened.push(store);
            }
            Err(e) => tracing::warn!("Skipping shard {}: {}", path.display(), e),
        }
    }

    if opened.is_empty() {
        tracing::warn!(
            "No .{} shards found in {}",
            extension,
            directory.display()
        );
    }

    Ok(opened)
}

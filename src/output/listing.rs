//! Collection listings
//!
//! Prints every entry of a collection in ascending key order. Log timestamps
//! are shown both raw and as UTC dates.

use crate::storage::{Collection, Store, StorageResult};
use chrono::{TimeZone, Utc};
use std::io::Write;

/// Formats one entry of `collection` as a single line
pub fn format_entry(collection: Collection, key: &[u8], value: &[u8]) -> String {
    let key = String::from_utf8_lossy(key);
    let value = String::from_utf8_lossy(value);

    match collection {
        Collection::Frontier => key.into_owned(),
        Collection::Log => {
            let date = value
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
                .map(|at| at.to_rfc3339())
                .unwrap_or_else(|| "invalid timestamp".to_string());
            format!("{}\t{} ({})", key, value, date)
        }
        Collection::Index | Collection::Title | Collection::Meta => {
            format!("{}\t{}", key, value)
        }
    }
}

/// Writes every entry of `collection` to `out`
///
/// # Returns
///
/// The number of entries written
pub fn write_collection<W: Write>(
    store: &dyn Store,
    collection: Collection,
    out: &mut W,
) -> StorageResult<usize> {
    let mut write_error = None;

    let visited = store.visit_ascending(collection, b"", &mut |key, value| {
        match writeln!(out, "{}", format_entry(collection, key, value)) {
            Ok(()) => true,
            Err(e) => {
                write_error = Some(e);
                false
            }
        }
    })?;

    match write_error {
        Some(e) => Err(e.into()),
        None => Ok(visited),
    }
}

/// Prints every entry of `collection` to stdout
pub fn list_collection(store: &dyn Store, collection: Collection) -> StorageResult<usize> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    write_collection(store, collection, &mut out)
}

//! Statistics generation from a crawl store
//!
//! This module provides functionality for extracting and displaying
//! entry counts and crawl progress from the storage layer.

use crate::crawler::is_overdue;
use crate::storage::{Collection, Store, StorageResult};
use chrono::{TimeZone, Utc};

/// Store statistics summary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStatistics {
    /// Entry count of every collection, in listing order
    pub counts: Vec<(Collection, u64)>,

    /// Logged URLs whose revisit interval has elapsed
    pub overdue: u64,

    /// Most recent crawl timestamp in the log
    pub last_crawl: Option<i64>,
}

impl StoreStatistics {
    /// Returns the entry count of `collection`
    pub fn count(&self, collection: Collection) -> u64 {
        self.counts
            .iter()
            .find(|(c, _)| *c == collection)
            .map_or(0, |(_, n)| *n)
    }
}

/// Loads statistics from a store
///
/// # Arguments
///
/// * `store` - The store to query
/// * `now` - Reference time for the overdue count
///
/// # Returns
///
/// * `Ok(StoreStatistics)` - Successfully loaded statistics
/// * `Err(StorageError)` - Failed to query the store
pub fn load_statistics(store: &dyn Store, now: i64) -> StorageResult<StoreStatistics> {
    let mut counts = Vec::with_capacity(Collection::ALL.len());
    for collection in Collection::ALL {
        counts.push((collection, store.count(collection)?));
    }

    let mut overdue = 0;
    let mut last_crawl: Option<i64> = None;

    store.visit_ascending(Collection::Log, b"", &mut |_, value| {
        if let Some(at) = std::str::from_utf8(value)
            .ok()
            .and_then(|v| v.trim().parse::<i64>().ok())
        {
            if is_overdue(at, now) {
                overdue += 1;
            }
            last_crawl = Some(last_crawl.map_or(at, |last| last.max(at)));
        }
        true
    })?;

    Ok(StoreStatistics {
        counts,
        overdue,
        last_crawl,
    })
}

/// Formats statistics for display
pub fn format_statistics(stats: &StoreStatistics) -> String {
    let mut out = String::from("=== Store Statistics ===\n\n");

    out.push_str("Collections:\n");
    for (collection, count) in &stats.counts {
        out.push_str(&format!("  {:<14} {}\n", collection.name(), count));
    }
    out.push('\n');

    out.push_str(&format!(
        "Pending fetch: {}\n",
        stats.count(Collection::Frontier)
    ));
    out.push_str(&format!("Due for recrawl: {}\n", stats.overdue));

    let last = stats
        .last_crawl
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .map_or_else(|| "never".to_string(), |at| at.to_rfc3339());
    out.push_str(&format!("Last crawl: {}\n", last));

    out
}

/// Prints statistics to stdout
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &StoreStatistics) {
    print!("{}", format_statistics(stats));
}

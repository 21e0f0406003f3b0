//! Frontier and recrawl scheduler
//!
//! This module handles:
//! - Canonicalizing and enqueuing discovered URLs (idempotent)
//! - Scanning the frontier for URLs pending a fetch
//! - Recording crawl attempts in the log
//! - Re-enqueuing logged URLs once the revisit interval has elapsed

use crate::storage::{get_text, Collection, Store, StorageError, StorageResult};
use crate::url::{canonicalize, validate_crawlable, Scope};
use chrono::Utc;

/// Minimum time before a crawled URL becomes eligible for another fetch
pub const REVISIT_INTERVAL_SECS: i64 = 7 * 24 * 60 * 60;

/// Current time as Unix seconds
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Recrawl-aware frontier over the store's `Frontier` and `Log` collections
///
/// The scheduler holds no state of its own beyond the canonicalization scope;
/// every decision is read from the store passed in, so the same instance can
/// be shared by the coordinator and the response processor.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scheduler {
    scope: Scope,
}

impl Scheduler {
    /// Creates a new scheduler
    ///
    /// # Arguments
    ///
    /// * `scope` - How much of each URL is kept when canonicalizing
    pub fn new(scope: Scope) -> Self {
        Self { scope }
    }

    /// Returns the canonicalization scope
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Canonicalizes `url` with this scheduler's scope
    pub fn canonical(&self, url: &str) -> String {
        canonicalize(url, self.scope)
    }

    /// Canonicalizes a URL and marks it pending
    ///
    /// URLs that are not fetchable HTTP(S) URLs after canonicalization are
    /// dropped.
    ///
    /// # Returns
    ///
    /// * `Ok(true)` - The URL was added to the frontier
    /// * `Ok(false)` - Already pending, or rejected
    pub fn enqueue(&self, store: &mut dyn Store, url: &str) -> StorageResult<bool> {
        let canonical = self.canonical(url);

        if let Err(e) = validate_crawlable(&canonical) {
            tracing::debug!("Not enqueuing {}: {}", url, e);
            return Ok(false);
        }

        if store.get(Collection::Frontier, canonical.as_bytes())?.is_some() {
            return Ok(false);
        }

        store.set(Collection::Frontier, canonical.as_bytes(), b"")?;
        tracing::trace!("Enqueued {}", canonical);
        Ok(true)
    }

    /// Enqueues a link discovered on a page, honoring the revisit interval
    ///
    /// A URL that already has a log entry is only added back once it is due.
    /// Unreadable timestamps count as never crawled, as in
    /// [`Scheduler::requeue_overdue`].
    pub fn enqueue_discovered(
        &self,
        store: &mut dyn Store,
        url: &str,
        now: i64,
    ) -> StorageResult<bool> {
        let canonical = self.canonical(url);

        let due = match self.last_crawled(store, &canonical) {
            Ok(Some(last)) => is_overdue(last, now),
            Ok(None) | Err(StorageError::Codec(_)) => true,
            Err(e) => return Err(e),
        };
        if !due {
            tracing::trace!("Not enqueuing {}: crawled recently", canonical);
            return Ok(false);
        }

        self.enqueue(store, &canonical)
    }

    /// Returns every pending URL in ascending key order
    ///
    /// The result is a snapshot taken at scan start; URLs enqueued afterwards
    /// wait for the next pass.
    pub fn scan_due(&self, store: &dyn Store) -> StorageResult<Vec<String>> {
        let mut pending = Vec::new();
        let mut invalid = 0;

        store.visit_ascending(Collection::Frontier, b"", &mut |key, _| {
            match std::str::from_utf8(key) {
                Ok(url) => pending.push(url.to_string()),
                Err(_) => invalid += 1,
            }
            true
        })?;

        if invalid > 0 {
            tracing::warn!("Skipped {} frontier keys that are not UTF-8", invalid);
        }

        Ok(pending)
    }

    /// Returns the time of the last crawl attempt for `url`, if any
    pub fn last_crawled(&self, store: &dyn Store, url: &str) -> StorageResult<Option<i64>> {
        get_text(store, Collection::Log, url)?
            .map(|value| parse_timestamp(url, &value))
            .transpose()
    }

    /// Returns true if `url` has never been attempted or its revisit interval has elapsed
    pub fn is_due(&self, store: &dyn Store, url: &str, now: i64) -> StorageResult<bool> {
        Ok(match self.last_crawled(store, url)? {
            Some(last) => is_overdue(last, now),
            None => true,
        })
    }

    /// Puts a logged URL back into the frontier if it is due
    ///
    /// # Returns
    ///
    /// true if the URL was re-enqueued
    pub fn requeue(&self, store: &mut dyn Store, url: &str, now: i64) -> StorageResult<bool> {
        if !self.is_due(store, url, now)? {
            return Ok(false);
        }
        if store.get(Collection::Frontier, url.as_bytes())?.is_some() {
            return Ok(false);
        }
        store.set(Collection::Frontier, url.as_bytes(), b"")?;
        Ok(true)
    }

    /// Walks the log and re-enqueues every URL whose revisit interval has elapsed
    ///
    /// # Returns
    ///
    /// The number of URLs put back into the frontier
    pub fn requeue_overdue(&self, store: &mut dyn Store, now: i64) -> StorageResult<usize> {
        let mut overdue = Vec::new();
        let mut malformed = 0;

        store.visit_ascending(Collection::Log, b"", &mut |key, value| {
            let last = std::str::from_utf8(value)
                .ok()
                .and_then(|v| v.trim().parse::<i64>().ok());
            match (std::str::from_utf8(key), last) {
                (Ok(url), Some(last)) if is_overdue(last, now) => overdue.push(url.to_string()),
                (Ok(url), None) => {
                    // Unreadable timestamps count as never crawled
                    malformed += 1;
                    overdue.push(url.to_string());
                }
                _ => {}
            }
            true
        })?;

        if malformed > 0 {
            tracing::warn!("{} log entries had unreadable timestamps", malformed);
        }

        let mut requeued = 0;
        for url in overdue {
            if store.get(Collection::Frontier, url.as_bytes())?.is_none() {
                store.set(Collection::Frontier, url.as_bytes(), b"")?;
                requeued += 1;
            }
        }

        if requeued > 0 {
            tracing::info!("Requeued {} URLs past their revisit interval", requeued);
        }

        Ok(requeued)
    }

    /// Records a completed fetch attempt
    ///
    /// Writes the log entry and removes the frontier entry together, so a URL
    /// leaves the frontier exactly when its log timestamp is written.
    pub fn mark_crawled(&self, store: &mut dyn Store, url: &str, now: i64) -> StorageResult<()> {
        store.set(Collection::Log, url.as_bytes(), now.to_string().as_bytes())?;
        store.delete(Collection::Frontier, url.as_bytes())?;
        Ok(())
    }
}

/// Returns true once a URL last crawled at `last` is due again at `now`
pub(crate) fn is_overdue(last: i64, now: i64) -> bool {
    now.saturating_sub(last) >= REVISIT_INTERVAL_SECS
}

fn parse_timestamp(url: &str, value: &str) -> StorageResult<i64> {
    value.trim().parse().map_err(|_| {
        StorageError::Codec(format!("invalid crawl timestamp {:?} for {}", value, url))
    })
}

//! Keyword index
//!
//! This module maintains the inverted index mapping each normalized term to
//! the deduplicated, ordered list of canonical URLs it was found on.

mod postings;
mod terms;

pub use postings::{PostingList, LEGACY_DELIMITER};
pub use terms::{is_indexable, normalize_terms, MIN_TERM_LEN, STOPWORDS};

use crate::storage::{Collection, Store, StorageResult};

/// Indexes the terms of `text` under `url`
///
/// Each surviving term's posting list is read, extended with `url` if it is
/// not already present, and written back. This is a read-modify-write
/// sequence and must only run from the single response processor.
///
/// # Arguments
///
/// * `store` - The store holding the keyword index
/// * `url` - Canonical URL of the page the text came from
/// * `text` - Keyword-bearing text
///
/// # Returns
///
/// The number of posting lists that gained `url`
pub fn add_keywords(store: &mut dyn Store, url: &str, text: &str) -> StorageResult<usize> {
    let mut added = 0;

    for term in normalize_terms(text) {
        let postings = match store.get(Collection::Index, term.as_bytes())? {
            Some(bytes) => {
                let mut list = PostingList::decode(&bytes)?;
                if !list.insert(url) {
                    continue;
                }
                list
            }
            None => PostingList::singleton(url),
        };

        store.set(Collection::Index, term.as_bytes(), &postings.encode()?)?;
        added += 1;
    }

    if added > 0 {
        tracing::trace!("Indexed {} new term postings for {}", added, url);
    }

    Ok(added)
}

/// Reads the posting list stored under `term`
///
/// Returns an empty list when the term is absent.
pub fn lookup(store: &dyn Store, term: &str) -> StorageResult<PostingList> {
    match store.get(Collection::Index, term.as_bytes())? {
        Some(bytes) => PostingList::decode(&bytes),
        None => Ok(PostingList::default()),
    }
}

//! Query evaluation and ranking
//!
//! Scoring runs in two passes over every shard:
//!
//! 1. Exact: each hit for the term at position `i` of an `n`-term query
//!    scores `n - i`, so earlier terms weigh more.
//! 2. Expansion: only when fewer than [`FUZZY_EXPANSION_THRESHOLD`] distinct
//!    URLs were found, every suffix variant of every stemmed term is looked
//!    up and each hit adds 1.
//!
//! Results are ranked by a composite string key: the last three digits of
//! the zero-padded score followed by URL, title and meta. Keys sort
//! lexicographically and are emitted in reverse, so ranking follows the
//! score only while scores stay below 1000; a score of 1500 ranks as 500.

use crate::index::lookup;
use crate::search::expansion::{stem, variants};
use crate::storage::{get_text, Collection, Store, StorageResult};
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Below this many distinct exact-match URLs, query expansion runs
pub const FUZZY_EXPANSION_THRESHOLD: usize = 150;

/// One ranked search result
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub score: usize,
    pub url: String,
    /// Page title, empty if no shard has one
    pub title: String,
    /// Meta description, empty if no shard has one
    pub meta: String,
}

impl SearchHit {
    /// Returns the composite key results are ordered by
    ///
    /// Only the last three digits of the score are kept.
    pub fn ranking_key(&self) -> String {
        let padded = format!("{:03}", self.score);
        let digits = &padded[padded.len() - 3..];
        format!("{}\n{}\n{}\n{}\n", digits, self.url, self.title, self.meta)
    }
}

/// The outcome of one search
#[derive(Debug, Clone)]
pub struct SearchResults {
    /// Hits, best first
    pub hits: Vec<SearchHit>,

    /// Whether the expansion pass ran
    pub expanded: bool,

    /// Wall-clock time spent searching
    pub elapsed: Duration,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

/// Splits a phrase into query terms
///
/// Terms are lowercased and split on single spaces. Stopwords are kept and
/// repeated spaces produce empty terms, which still count toward the
/// positional weights.
pub fn query_terms(phrase: &str) -> Vec<String> {
    phrase.to_lowercase().split(' ').map(str::to_string).collect()
}

/// Adds `weight` to the score of every URL indexed under `term` in any shard
fn score_term<S: Store>(
    shards: &[S],
    term: &str,
    weight: usize,
    scores: &mut HashMap<String, usize>,
) -> StorageResult<()> {
    for shard in shards {
        for url in lookup(shard, term)?.into_urls() {
            *scores.entry(url).or_insert(0) += weight;
        }
    }
    Ok(())
}

/// Reads a display value from the first shard that has a non-empty one
fn first_non_empty<S: Store>(
    shards: &[S],
    collection: Collection,
    url: &str,
) -> StorageResult<String> {
    for shard in shards {
        if let Some(value) = get_text(shard, collection, url)? {
            if !value.is_empty() {
                return Ok(value);
            }
        }
    }
    Ok(String::new())
}

/// Pass 1: adds positional weights for exact term hits
///
/// The term at position `i` of `n` terms weighs `n - i`.
pub fn exact_pass<S: Store>(
    shards: &[S],
    terms: &[String],
    scores: &mut HashMap<String, usize>,
) -> StorageResult<()> {
    for (i, term) in terms.iter().enumerate() {
        score_term(shards, term, terms.len() - i, scores)?;
    }
    Ok(())
}

/// Pass 2: adds 1 per hit for every suffix variant of every stemmed term
///
/// Empty terms have no stem and are skipped.
pub fn expansion_pass<S: Store>(
    shards: &[S],
    terms: &[String],
    scores: &mut HashMap<String, usize>,
) -> StorageResult<()> {
    let expansions: Vec<String> = terms
        .iter()
        .filter(|term| !term.is_empty())
        .flat_map(|term| variants(stem(term)))
        .collect();

    tracing::debug!(
        "{} exact matches, searching {} variants",
        scores.len(),
        expansions.len()
    );

    for variant in &expansions {
        score_term(shards, variant, 1, scores)?;
    }
    Ok(())
}

/// Scores every URL matching `phrase` across `shards`
///
/// Returns the raw scores and whether the expansion pass ran.
pub fn score_phrase<S: Store>(
    shards: &[S],
    phrase: &str,
) -> StorageResult<(HashMap<String, usize>, bool)> {
    let terms = query_terms(phrase);
    let mut scores = HashMap::new();

    exact_pass(shards, &terms, &mut scores)?;

    let expanded = scores.len() < FUZZY_EXPANSION_THRESHOLD;
    if expanded {
        expansion_pass(shards, &terms, &mut scores)?;
    }

    Ok((scores, expanded))
}

/// Orders hits by their ranking key, best first
pub fn rank(mut hits: Vec<SearchHit>) -> Vec<SearchHit> {
    hits.sort_by_cached_key(SearchHit::ranking_key);
    hits.reverse();
    hits
}

/// Searches `shards` for `phrase`
///
/// # Arguments
///
/// * `shards` - Open stores to search, in precedence order for titles and metas
/// * `phrase` - Free-text query
///
/// # Example
///
/// ```no_run
/// use dragnet::search::{open_shards, search};
/// use std::path::Path;
///
/// let shards = open_shards(Path::new("."), "dragnet").unwrap();
/// let results = search(&shards, "rust crawler").unwrap();
/// for hit in &results.hits {
///     println!("{} {}", hit.score, hit.url);
/// }
/// ```
pub fn search<S: Store>(shards: &[S], phrase: &str) -> StorageResult<SearchResults> {
    let started = Instant::now();

    let (scores, expanded) = score_phrase(shards, phrase)?;

    let mut hits = Vec::with_capacity(scores.len());
    for (url, score) in scores {
        let title = first_non_empty(shards, Collection::Title, &url)?;
        let meta = first_non_empty(shards, Collection::Meta, &url)?;
        hits.push(SearchHit {
            score,
            url,
            title,
            meta,
        });
    }

    Ok(SearchResults {
        hits: rank(hits),
        expanded,
        elapsed: started.elapsed(),
    })
}

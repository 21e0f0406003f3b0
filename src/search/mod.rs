//! Keyword search over one or more shards
//!
//! This module handles:
//! - Discovering and opening shard files read-only
//! - Two-pass scoring with suffix-based query expansion
//! - Title and meta enrichment and the final ranking

mod engine;
mod expansion;
mod shards;

pub use engine::{
    exact_pass, expansion_pass, query_terms, rank, score_phrase, search, SearchHit,
    SearchResults, FUZZY_EXPANSION_THRESHOLD,
};
pub use expansion::{join_suffix, stem, variants, SUFFIXES};
pub use shards::{discover_shards, open_shards};

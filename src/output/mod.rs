//! Output module for terminal rendering
//!
//! This module handles:
//! - Printing ranked search results with count and timing
//! - Listing the entries of a store collection
//! - Summarizing store contents and crawl progress

mod listing;
mod results;
pub mod stats;

pub use listing::{format_entry, list_collection, write_collection};
pub use results::{format_results, print_results};
pub use stats::{format_statistics, load_statistics, print_statistics, StoreStatistics};

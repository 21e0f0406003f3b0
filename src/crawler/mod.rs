//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The recrawl-aware frontier scheduler
//! - Concurrent HTTP fetch workers
//! - Lazy HTML tokenization and content extraction
//! - The single response processor and the periodic checkpoint task
//! - Overall crawl coordination

mod checkpoint;
mod coordinator;
mod fetcher;
mod parser;
mod processor;
mod scheduler;
mod tokenizer;

pub use checkpoint::{checkpoint_now, spawn_checkpointer};
pub use coordinator::{run_crawl, Coordinator, PassSummary, ShutdownHandle};
pub use fetcher::{
    build_http_client, fetch_url, fetch_worker, user_agent_string, FetchedPage, RequestQueue,
    WorkerSummary,
};
pub use parser::{extract, parse_html, ExtractedLink, ExtractedPage};
pub use processor::{apply_page, ContentKind, Processor};
pub use scheduler::{unix_now, Scheduler, REVISIT_INTERVAL_SECS};
pub(crate) use scheduler::is_overdue;
pub use tokenizer::{HtmlToken, TokenStream};

//! Dragnet main entry point
//!
//! This is the command-line interface for the Dragnet crawler and search tool.

use anyhow::Context;
use clap::{Parser, Subcommand};
use dragnet::config::{load_or_default, Config};
use dragnet::crawler::{run_crawl, unix_now};
use dragnet::output::{list_collection, load_statistics, print_results, print_statistics};
use dragnet::search::{open_shards, search};
use dragnet::storage::{open_store, Collection, Store};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Dragnet: a recrawling web indexer
///
/// Dragnet crawls pages from seed URLs, indexes their titles, headings and
/// descriptions, revisits them weekly, and answers keyword searches over
/// one or more crawl stores.
#[derive(Parser, Debug)]
#[command(name = "dragnet")]
#[command(version)]
#[command(about = "A recrawling web indexer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl pending URLs plus any seed URLs given
    ///
    /// Reserved targets: `all-urls` keeps full paths when canonicalizing,
    /// `forever` repeats passes until interrupted.
    Crawl {
        /// Seed URLs and reserved targets
        #[arg(value_name = "TARGETS")]
        targets: Vec<String>,
    },

    /// Search every shard for the given words
    Search {
        #[arg(required = true, value_name = "WORDS")]
        words: Vec<String>,
    },

    /// Print every entry of a collection
    List {
        /// scan-queue, scan-log, keyword-index, title or meta
        collection: Collection,
    },

    /// Remove every entry of a collection
    Clear {
        /// scan-queue, scan-log, keyword-index, title or meta
        collection: Collection,
    },

    /// Write a compacted copy of the store
    Compact {
        /// Destination file
        destination: PathBuf,
    },

    /// Show entry counts and recrawl status
    Stats,
}

/// Seeds and switches parsed from the crawl targets
#[derive(Debug, Default, PartialEq, Eq)]
struct CrawlTargets {
    seeds: Vec<String>,
    all_urls: bool,
    forever: bool,
}

impl CrawlTargets {
    fn parse(targets: &[String]) -> Self {
        let mut parsed = Self::default();

        for target in targets {
            match target.as_str() {
                "all-urls" => parsed.all_urls = true,
                "forever" => parsed.forever = true,
                "start-http" | "start-https" => tracing::warn!(
                    "'{}' ignored: the web search front end is not part of this build",
                    target
                ),
                seed => parsed.seeds.push(seed.to_string()),
            }
        }

        parsed
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let config = load_or_default(cli.config.as_deref()).with_context(|| match &cli.config {
        Some(path) => format!("Failed to load configuration from {}", path.display()),
        None => "Invalid default configuration".to_string(),
    })?;

    match cli.command {
        Command::Crawl { targets } => handle_crawl(config, &targets).await,
        Command::Search { words } => handle_search(&config, &words.join(" ")),
        Command::List { collection } => handle_list(&config, collection),
        Command::Clear { collection } => handle_clear(&config, collection),
        Command::Compact { destination } => handle_compact(&config, &destination),
        Command::Stats => handle_stats(&config),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("dragnet=info,warn"),
            1 => EnvFilter::new("dragnet=debug,info"),
            2 => EnvFilter::new("dragnet=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Opens the crawler's store, which is fatal to fail
fn open_crawl_store(config: &Config) -> anyhow::Result<dragnet::SqliteStore> {
    let path = Path::new(&config.storage.database_path);
    open_store(path).with_context(|| format!("Failed to open store {}", path.display()))
}

/// Handles the crawl command
async fn handle_crawl(mut config: Config, targets: &[String]) -> anyhow::Result<()> {
    let targets = CrawlTargets::parse(targets);
    if targets.all_urls {
        config.crawler.scope_limit = false;
    }

    let store = open_crawl_store(&config)?;
    tracing::info!(
        "Crawling with store {} ({} seeds{})",
        config.storage.database_path,
        targets.seeds.len(),
        if targets.forever { ", forever" } else { "" }
    );

    match run_crawl(config, store, &targets.seeds, targets.forever).await {
        Ok(passes) => {
            tracing::info!("Crawl finished after {} passes", passes.len());
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}

/// Handles the search command
fn handle_search(config: &Config, phrase: &str) -> anyhow::Result<()> {
    let directory = Path::new(&config.search.shard_directory);
    let shards = open_shards(directory, &config.search.shard_extension)
        .with_context(|| format!("Failed to read shard directory {}", directory.display()))?;

    let results = search(&shards, phrase)?;
    print_results(&results);
    Ok(())
}

/// Handles the list command
fn handle_list(config: &Config, collection: Collection) -> anyhow::Result<()> {
    let store = open_crawl_store(config)?;
    let listed = list_collection(&store, collection)?;
    tracing::debug!("Listed {} entries of {}", listed, collection);
    Ok(())
}

/// Handles the clear command
fn handle_clear(config: &Config, collection: Collection) -> anyhow::Result<()> {
    let mut store = open_crawl_store(config)?;
    let removed = store.remove_collection(collection)?;
    store.flush()?;
    println!("Removed {} entries from {}", removed, collection);
    Ok(())
}

/// Handles the compact command
fn handle_compact(config: &Config, destination: &Path) -> anyhow::Result<()> {
    let mut store = open_crawl_store(config)?;
    store
        .copy_to(destination)
        .with_context(|| format!("Failed to compact into {}", destination.display()))?;
    println!("Compacted store written to {}", destination.display());
    Ok(())
}

/// Handles the stats command
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    let store = open_crawl_store(config)?;
    println!("Store: {}\n", config.storage.database_path);
    print_statistics(&load_statistics(&store, unix_now())?);
    Ok(())
}

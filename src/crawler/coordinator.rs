//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the crawl loop that coordinates all aspects of
//! the crawling process, including:
//! - Seeding the frontier
//! - Re-enqueuing overdue URLs before each pass
//! - Wiring fetch workers, the processor and the checkpoint task together
//! - Handling shutdown and the final flush

use crate::config::Config;
use crate::crawler::checkpoint::{checkpoint_now, spawn_checkpointer};
use crate::crawler::fetcher::{build_http_client, fetch_worker, FetchedPage, WorkerSummary};
use crate::crawler::processor::Processor;
use crate::crawler::scheduler::{unix_now, Scheduler};
use crate::storage::{SharedStore, SqliteStore};
use crate::url::Scope;
use crate::{DragnetError, Result};
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinSet;

/// Counters for one crawl pass
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PassSummary {
    /// URLs found pending when the pass started
    pub scheduled: usize,
    /// Logged URLs put back into the frontier before the scan
    pub requeued: usize,
    /// Fetches that produced a response
    pub fetched: usize,
    /// Fetches that failed in transport and stay pending
    pub fetch_failures: usize,
    /// Pages marked crawled
    pub processed: usize,
}

impl fmt::Display for PassSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} scheduled ({} requeued), {} fetched, {} failed, {} processed",
            self.scheduled, self.requeued, self.fetched, self.fetch_failures, self.processed
        )
    }
}

/// Requests shutdown of a running crawl
#[derive(Clone)]
pub struct ShutdownHandle {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownHandle {
    /// Signals every task of the crawl to stop
    ///
    /// Workers stop pulling new URLs, the processor drains what was already
    /// fetched, and the pass ends with a flush.
    pub fn shutdown(&self) {
        self.sender.send_replace(true);
    }
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    store: SharedStore,
    scheduler: Scheduler,
    client: Client,
    shutdown_tx: Arc<watch::Sender<bool>>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Coordinator {
    /// Creates a new coordinator instance
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `store` - The crawler's store, opened by the caller
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(DragnetError)` - Failed to build the HTTP client
    pub fn new(config: Config, store: SqliteStore) -> Result<Self> {
        let client =
            build_http_client(&config.user_agent, config.crawler.fetch_timeout())?;
        let scheduler = Scheduler::new(Scope::from_limit(config.crawler.scope_limit));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tracing::debug!(
            "Coordinator ready: {} workers, scope {:?}",
            config.crawler.workers,
            scheduler.scope()
        );

        Ok(Self {
            config: Arc::new(config),
            store: SharedStore::new(store),
            scheduler,
            client,
            shutdown_tx: Arc::new(shutdown_tx),
            shutdown_rx,
        })
    }

    /// Returns the shared store handle
    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Returns the frontier scheduler
    pub fn scheduler(&self) -> Scheduler {
        self.scheduler
    }

    /// Returns a handle that stops the crawl from another task
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            sender: Arc::clone(&self.shutdown_tx),
        }
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown_rx.borrow()
    }

    /// Canonicalizes and enqueues seed URLs
    ///
    /// # Returns
    ///
    /// The number of seeds that were not already pending
    pub fn enqueue_seeds<S: AsRef<str>>(&self, seeds: &[S]) -> Result<usize> {
        let mut store = self.store.lock()?;
        let mut added = 0;

        for seed in seeds {
            if self.scheduler.enqueue(&mut *store, seed.as_ref())? {
                added += 1;
            } else {
                tracing::debug!("Seed {} already pending or not crawlable", seed.as_ref());
            }
        }

        tracing::info!("Enqueued {} of {} seed URLs", added, seeds.len());
        Ok(added)
    }

    /// Runs one crawl pass
    ///
    /// 1. Re-enqueue logged URLs past their revisit interval
    /// 2. Snapshot the frontier
    /// 3. Feed the snapshot to the fetch workers
    /// 4. Wait for the workers and the processor to finish
    /// 5. Stop the checkpoint task and flush
    ///
    /// URLs discovered during the pass wait for the next one.
    pub async fn run_pass(&self) -> Result<PassSummary> {
        let mut summary = PassSummary::default();

        let due = {
            let mut store = self.store.lock()?;
            summary.requeued = self.scheduler.requeue_overdue(&mut *store, unix_now())?;
            self.scheduler.scan_due(&*store)?
        };
        summary.scheduled = due.len();

        if due.is_empty() {
            tracing::info!("Frontier is empty, nothing to crawl");
            checkpoint_now(&self.store).await?;
            return Ok(summary);
        }

        tracing::info!("Starting pass over {} URLs", due.len());

        let capacity = self.config.crawler.channel_capacity;
        let (request_tx, request_rx) = mpsc::channel::<String>(capacity);
        let (response_tx, response_rx) = mpsc::channel::<FetchedPage>(capacity);
        let requests = Arc::new(Mutex::new(request_rx));

        let mut workers = JoinSet::new();
        for id in 0..self.config.crawler.workers {
            workers.spawn(fetch_worker(
                id,
                self.client.clone(),
                Arc::clone(&requests),
                response_tx.clone(),
                self.shutdown_rx.clone(),
            ));
        }
        // The processor finishes once every worker has dropped its sender
        drop(response_tx);

        let processor = Processor::new(self.store.clone(), self.scheduler);
        let processor_task = tokio::spawn(processor.run(response_rx));

        let (stop_tx, stop_rx) = watch::channel(false);
        let checkpointer = spawn_checkpointer(
            self.store.clone(),
            self.config.crawler.checkpoint_interval(),
            stop_rx,
        );

        self.feed(request_tx, due).await;

        while let Some(joined) = workers.join_next().await {
            match joined {
                Ok(WorkerSummary { fetched, failed }) => {
                    summary.fetched += fetched;
                    summary.fetch_failures += failed;
                }
                Err(e) => tracing::error!("Fetch worker failed: {}", e),
            }
        }

        summary.processed = processor_task
            .await
            .map_err(|e| DragnetError::Task(e.to_string()))?;

        stop_tx.send_replace(true);
        if let Err(e) = checkpointer.await {
            tracing::error!("Checkpoint task failed: {}", e);
        }
        checkpoint_now(&self.store).await?;

        tracing::info!("Pass complete: {}", summary);
        Ok(summary)
    }

    /// Sends URLs to the workers until done or shutdown is requested
    async fn feed(&self, requests: mpsc::Sender<String>, urls: Vec<String>) {
        let mut shutdown = self.shutdown_rx.clone();

        for url in urls {
            if *shutdown.borrow() {
                break;
            }

            tokio::select! {
                sent = requests.send(url) => {
                    if sent.is_err() {
                        tracing::warn!("All fetch workers have stopped");
                        break;
                    }
                }
                _ = shutdown.changed() => break,
            }
        }
    }

    /// Runs crawl passes
    ///
    /// With `forever`, passes repeat with the configured sleep in between
    /// until shutdown is requested; otherwise exactly one pass runs.
    ///
    /// # Returns
    ///
    /// The summary of every completed pass
    pub async fn run(&self, forever: bool) -> Result<Vec<PassSummary>> {
        let mut passes = Vec::new();
        let mut shutdown = self.shutdown_rx.clone();

        loop {
            passes.push(self.run_pass().await?);

            if !forever || self.is_shutting_down() {
                break;
            }

            let pause = self.config.crawler.pass_interval();
            tracing::info!("Sleeping {:?} before the next pass", pause);
            tokio::select! {
                _ = tokio::time::sleep(pause) => {}
                _ = shutdown.changed() => break,
            }
        }

        Ok(passes)
    }

    /// Flushes the store and releases it
    pub async fn shutdown(self) -> Result<()> {
        checkpoint_now(&self.store).await?;
        tracing::info!("Store flushed, crawler stopped");
        Ok(())
    }
}

/// Runs a crawl from seeds with an already opened store
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `store` - The crawler's store
/// * `seeds` - Seed URLs to enqueue before the first pass
/// * `forever` - Keep crawling until Ctrl-C
///
/// # Example
///
/// ```no_run
/// use dragnet::config::Config;
/// use dragnet::crawler::run_crawl;
/// use dragnet::storage::open_store;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = Config::default();
/// let store = open_store(Path::new(&config.storage.database_path))?;
/// run_crawl(config, store, &["http://example.com"], false).await?;
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl<S: AsRef<str>>(
    config: Config,
    store: SqliteStore,
    seeds: &[S],
    forever: bool,
) -> Result<Vec<PassSummary>> {
    let coordinator = Coordinator::new(config, store)?;
    coordinator.enqueue_seeds(seeds)?;

    let handle = coordinator.shutdown_handle();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing current work");
            handle.shutdown();
        }
    });

    let result = coordinator.run(forever).await;
    ctrl_c.abort();

    coordinator.shutdown().await?;
    result
}

//! Harvest coordinator - pipeline orchestration
//!
//! Ties the stages together: discovery, then the fetch fan-out feeding a single
//! parse-and-store consumer through a bounded channel. The coordinator waits
//! for both ends; the channel closes once every fetch task has finished, which
//! is what lets the consumer return.

use crate::config::{validate, Config};
use crate::harvest::consumer::{spawn_consumer, HarvestStats};
use crate::harvest::discoverer::{Discoverer, DiscoverySettings};
use crate::harvest::fetcher::{build_http_client, fetch_all};
use crate::harvest::renderer::Renderer;
use crate::search::SearchFilter;
use crate::storage::Storage;
use crate::{HarvestError, Result};
use reqwest::Client;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

/// How a harvest ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HarvestOutcome {
    /// The listing had no items for the filter; nothing was fetched
    NoMatches,

    /// Items were fetched and processed
    Completed(HarvestStats),
}

/// Main harvest pipeline
pub struct Harvester<R, S> {
    discoverer: Discoverer<R>,
    client: Client,
    storage: Arc<Mutex<S>>,
    fetch_delay: Duration,
}

impl<R, S> Harvester<R, S>
where
    R: Renderer,
    S: Storage + Send + 'static,
{
    /// Creates a harvester from explicit parts
    pub fn new(
        discoverer: Discoverer<R>,
        client: Client,
        storage: Arc<Mutex<S>>,
        fetch_delay: Duration,
    ) -> Self {
        Self {
            discoverer,
            client,
            storage,
            fetch_delay,
        }
    }

    /// Creates a harvester wired from configuration
    ///
    /// # Arguments
    ///
    /// * `config` - The harvest configuration
    /// * `renderer` - Renderer used for the listing page
    /// * `storage` - Destination store
    ///
    /// # Returns
    ///
    /// * `Ok(Harvester)` - Ready to run
    /// * `Err(HarvestError::Config)` - The configuration failed validation
    /// * `Err(HarvestError)` - HTTP client setup failed
    pub fn from_config(config: &Config, renderer: R, storage: S) -> Result<Self> {
        validate(config)?;
        let settings = DiscoverySettings::from_config(config)?;
        let client = build_http_client(&config.fetch)?;

        Ok(Self::new(
            Discoverer::new(renderer, settings),
            client,
            Arc::new(Mutex::new(storage)),
            Duration::from_millis(config.fetch.delay_ms),
        ))
    }

    /// Shared handle to the store
    pub fn storage(&self) -> Arc<Mutex<S>> {
        Arc::clone(&self.storage)
    }

    /// Runs one harvest
    ///
    /// 1. Discover up to `max_results` item URLs
    /// 2. Return [`HarvestOutcome::NoMatches`] if there are none
    /// 3. Start the consumer on a channel of capacity `concurrency`
    /// 4. Fetch every URL with at most `concurrency` requests in flight
    /// 5. Wait for the consumer to drain the channel
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestOutcome)` - The harvest finished
    /// * `Err(HarvestError)` - Discovery failed or a store write failed
    pub async fn run(
        &self,
        filter: &SearchFilter,
        max_results: usize,
        concurrency: usize,
    ) -> Result<HarvestOutcome> {
        let urls = self.discoverer.discover(filter, max_results).await?;
        if urls.is_empty() {
            tracing::info!("No items match the search");
            return Ok(HarvestOutcome::NoMatches);
        }

        let expected = urls.len();
        let capacity = concurrency.max(1);
        let (tx, rx) = mpsc::channel(capacity);
        let consumer = spawn_consumer(rx, Arc::clone(&self.storage), expected);

        tracing::info!(
            "Fetching {} items ({} concurrent, {:?} delay)",
            expected,
            capacity,
            self.fetch_delay
        );
        let delivered = fetch_all(self.client.clone(), urls, tx, self.fetch_delay, capacity).await;

        let stats = consumer
            .await
            .map_err(|e| HarvestError::Task(format!("consumer task failed: {}", e)))??;

        tracing::info!(
            "Harvest complete: {} delivered, {} stored, {} duplicates, {} fetch failures, {} unnamed",
            delivered,
            stats.stored,
            stats.duplicates,
            stats.fetch_failures,
            stats.unnamed
        );

        Ok(HarvestOutcome::Completed(stats))
    }
}

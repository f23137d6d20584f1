//! Harvest pipeline
//!
//! This module contains the core harvesting logic, including:
//! - Listing rendering and item URL discovery
//! - HTTP fetching through a bounded fan-out
//! - Movie field extraction
//! - The single-writer parse-and-store consumer
//! - Overall pipeline coordination

mod consumer;
mod coordinator;
mod discoverer;
mod extractor;
mod fetcher;
mod renderer;

pub use consumer::{consume, spawn_consumer, HarvestStats};
pub use coordinator::{HarvestOutcome, Harvester};
pub use discoverer::{collect_item_urls, Discoverer, DiscoverySettings};
pub use extractor::{clean_genre_label, parse_genres, Extractor, Record};
pub use fetcher::{build_http_client, fetch_all, fetch_document, FetchResult, FetchedDocument};
pub use renderer::{
    pages_needed, ChromeRenderer, PaginationPlan, RenderError, Renderer, DONE_MARKER_CLASS,
    LOAD_MORE_SELECTOR,
};

use crate::config::Config;
use crate::search::SearchFilter;
use crate::storage::SqliteStorage;
use crate::Result;
use std::path::Path;

/// Runs a complete harvest with the production renderer and SQLite store
///
/// This is the main entry point for a harvest. It will:
/// 1. Open (or create) the database named in the configuration
/// 2. Launch a browser to render the listing
/// 3. Fetch, extract and store every discovered item
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `filter` - The validated search filter
///
/// # Returns
///
/// * `Ok(HarvestOutcome)` - Harvest finished (possibly with no matches)
/// * `Err(HarvestError)` - Harvest failed
pub async fn harvest(config: &Config, filter: &SearchFilter) -> Result<HarvestOutcome> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let renderer = ChromeRenderer::new(config.discovery.headless);
    let harvester = Harvester::from_config(config, renderer, storage)?;

    harvester
        .run(filter, config.harvest.max_results, config.fetch.concurrency)
        .await
}

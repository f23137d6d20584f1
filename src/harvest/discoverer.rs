//! Item URL discovery
//!
//! The discoverer renders the listing page for a [`SearchFilter`], paginating
//! only as far as the result cap requires, and collects item page URLs from
//! the rendered markup in document order.

use crate::config::Config;
use crate::harvest::extractor::compile;
use crate::harvest::renderer::{PaginationPlan, Renderer};
use crate::search::{item_url, listing_url, SearchFilter};
use crate::{HarvestError, Result};
use scraper::Html;
use std::time::Duration;
use url::Url;

/// One result entry on the listing page
pub const ITEM_NODE_SELECTOR: &str = "li.ipc-metadata-list-summary-item";

/// Title link inside a result entry
pub const ITEM_ANCHOR_SELECTOR: &str = "a.ipc-title-link-wrapper[href]";

/// Listing settings fixed at construction
#[derive(Debug, Clone)]
pub struct DiscoverySettings {
    pub base_url: Url,
    pub title_type: String,
    pub results_per_page: usize,
    pub render_timeout: Duration,
    pub load_more_wait: Duration,
    pub click_interval: Duration,
}

impl DiscoverySettings {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.catalog.base_url)?,
            title_type: config.catalog.title_type.clone(),
            results_per_page: config.catalog.results_per_page,
            render_timeout: Duration::from_secs(config.discovery.render_timeout_secs),
            load_more_wait: Duration::from_secs(config.discovery.load_more_wait_secs),
            click_interval: Duration::from_millis(config.discovery.click_interval_ms),
        })
    }
}

/// Finds item page URLs for a search
pub struct Discoverer<R> {
    renderer: R,
    settings: DiscoverySettings,
}

impl<R: Renderer> Discoverer<R> {
    pub fn new(renderer: R, settings: DiscoverySettings) -> Self {
        Self { renderer, settings }
    }

    /// Renders the listing for `filter` and returns up to `max_results` item URLs
    ///
    /// # Returns
    ///
    /// * `Ok(Vec<String>)` - Item URLs in listing order; may be shorter than
    ///   `max_results`, or empty when nothing matched
    /// * `Err(HarvestError)` - Rendering failed, timed out, or the listing
    ///   could not be queried
    pub async fn discover(&self, filter: &SearchFilter, max_results: usize) -> Result<Vec<String>> {
        let url = listing_url(&self.settings.base_url, &self.settings.title_type, filter);
        let plan = PaginationPlan::for_cap(
            max_results,
            self.settings.results_per_page,
            self.settings.click_interval,
            self.settings.load_more_wait,
        );
        tracing::info!("Discovering items from {}", url);

        let rendered = tokio::time::timeout(
            self.settings.render_timeout,
            self.renderer.render_listing(&url, &plan),
        )
        .await
        .map_err(|_| HarvestError::DiscoveryTimeout {
            url: url.clone(),
            timeout_secs: self.settings.render_timeout.as_secs(),
        })??;

        let urls = collect_item_urls(&rendered, &self.settings.base_url, max_results)?;
        tracing::info!("Discovered {} item URLs (cap {})", urls.len(), max_results);
        Ok(urls)
    }
}

/// Extracts item URLs from rendered listing markup
///
/// Entries without a usable title link are skipped. Collection stops as soon
/// as `max_results` URLs are gathered.
pub fn collect_item_urls(html: &str, base_url: &Url, max_results: usize) -> Result<Vec<String>> {
    let items = compile(ITEM_NODE_SELECTOR)?;
    let anchor = compile(ITEM_ANCHOR_SELECTOR)?;
    let document = Html::parse_document(html);

    let urls = document
        .select(&items)
        .filter_map(|item| item.select(&anchor).next())
        .filter_map(|a| a.value().attr("href"))
        .filter_map(|href| item_url(base_url, href))
        .take(max_results)
        .collect();

    Ok(urls)
}

use serde::Deserialize;

/// Main configuration structure for Reel-Harvest
///
/// Every section and key has a default, so an empty file (or no file at all)
/// yields a usable configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub catalog: CatalogConfig,
    pub discovery: DiscoveryConfig,
    pub fetch: FetchConfig,
    pub harvest: HarvestConfig,
    pub output: OutputConfig,
}

/// Where the catalog lives and how its listing pages are shaped
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Catalog root, e.g. `https://www.imdb.com`
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Number of items the listing reveals per "load more" click
    #[serde(rename = "results-per-page")]
    pub results_per_page: usize,

    /// Item type constraint placed on every listing query
    #[serde(rename = "title-type")]
    pub title_type: String,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.imdb.com".to_string(),
            results_per_page: 50,
            title_type: "feature".to_string(),
        }
    }
}

/// Listing render behavior
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Upper bound on the whole render step (seconds)
    #[serde(rename = "render-timeout-secs")]
    pub render_timeout_secs: u64,

    /// How long to wait for the "load more" control before treating the
    /// listing as a single page (seconds)
    #[serde(rename = "load-more-wait-secs")]
    pub load_more_wait_secs: u64,

    /// Pause between "load more" clicks (milliseconds)
    #[serde(rename = "click-interval-ms")]
    pub click_interval_ms: u64,

    /// Run the browser without a window
    pub headless: bool,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            render_timeout_secs: 300,
            load_more_wait_secs: 15,
            click_interval_ms: 1000,
            headless: true,
        }
    }
}

/// Item page retrieval
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Fixed delay each fetch task sleeps before its request (milliseconds)
    #[serde(rename = "delay-ms")]
    pub delay_ms: u64,

    /// Maximum simultaneous fetches, also the handoff channel capacity
    pub concurrency: usize,

    /// Per-request timeout (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Browser User-Agent sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            delay_ms: 1000,
            concurrency: 10,
            request_timeout_secs: 30,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                         (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36"
                .to_string(),
        }
    }
}

/// Harvest bounds
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HarvestConfig {
    /// Cap on the number of items discovered, fetched and stored
    #[serde(rename = "max-results")]
    pub max_results: usize,
}

impl Default for HarvestConfig {
    fn default() -> Self {
        Self { max_results: 50 }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory that receives one log subdirectory per run
    #[serde(rename = "log-dir")]
    pub log_dir: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            database_path: "./data.db".to_string(),
            log_dir: "./logs".to_string(),
        }
    }
}

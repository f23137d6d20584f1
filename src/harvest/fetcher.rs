//! HTTP fetcher and fetch fan-out
//!
//! This module handles all plain HTTP requests of a harvest, including:
//! - Building an HTTP client that presents itself as a desktop browser
//! - GET requests for item pages and the genre page
//! - Error classification into [`FetchResult`] variants
//! - The bounded fan-out that feeds item pages into the handoff channel

use crate::config::FetchConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;

const BROWSER_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";
const BROWSER_ACCEPT_LANGUAGE: &str = "en-US,en;q=0.5";
const BROWSER_REFERER: &str = "https://www.google.com/";

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: String,
        /// HTTP status code
        status_code: u16,
        /// Page body content
        body: String,
    },

    /// Server answered with a non-success status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, unreadable body, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Short description of a failed fetch, None on success
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::HttpError { status_code } => Some(format!("HTTP {}", status_code)),
            Self::NetworkError { error } => Some(error.clone()),
        }
    }
}

/// One item page travelling through the handoff channel
///
/// Every dispatched URL produces exactly one of these, whether or not the
/// fetch succeeded.
#[derive(Debug, Clone)]
pub struct FetchedDocument {
    /// The item URL that was requested
    pub source_url: String,
    /// What the request produced
    pub result: FetchResult,
}

/// Builds an HTTP client with browser-like default headers
///
/// # Arguments
///
/// * `config` - The fetch configuration (user agent and request timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use reel_harvest::config::FetchConfig;
/// use reel_harvest::harvest::build_http_client;
///
/// let client = build_http_client(&FetchConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &FetchConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(BROWSER_ACCEPT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static(BROWSER_ACCEPT_LANGUAGE),
    );
    headers.insert(REFERER, HeaderValue::from_static(BROWSER_REFERER));

    Client::builder()
        .user_agent(config.user_agent.clone())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - The URL to fetch
///
/// # Returns
///
/// A FetchResult indicating success or the type of failure
pub async fn fetch_document(client: &Client, url: &str) -> FetchResult {
    match client.get(url).send().await {
        Ok(response) => {
            let status = response.status();
            let final_url = response.url().to_string();

            if !status.is_success() {
                return FetchResult::HttpError {
                    status_code: status.as_u16(),
                };
            }

            match response.text().await {
                Ok(body) => FetchResult::Success {
                    final_url,
                    status_code: status.as_u16(),
                    body,
                },
                Err(e) => FetchResult::NetworkError {
                    error: format!("Failed to read body: {}", e),
                },
            }
        }
        Err(e) => {
            if e.is_timeout() {
                FetchResult::NetworkError {
                    error: "Request timeout".to_string(),
                }
            } else if e.is_connect() {
                FetchResult::NetworkError {
                    error: "Connection refused".to_string(),
                }
            } else {
                FetchResult::NetworkError {
                    error: e.to_string(),
                }
            }
        }
    }
}

/// Fetches every URL and hands the results to the consumer
///
/// At most `concurrency` fetches are in flight at once. Each task sleeps for
/// `delay` before its request and then sends exactly one [`FetchedDocument`],
/// failed fetches included. The channel closes once this function and every
/// task it spawned have dropped their senders.
///
/// If the receiving side goes away, no further URLs are dispatched and the
/// tasks still in flight are aborted.
///
/// # Returns
///
/// The number of documents delivered to the channel
pub async fn fetch_all(
    client: Client,
    urls: Vec<String>,
    tx: mpsc::Sender<FetchedDocument>,
    delay: Duration,
    concurrency: usize,
) -> usize {
    let semaphore = Arc::new(Semaphore::new(concurrency.max(1)));
    let mut tasks = JoinSet::new();

    for url in urls {
        let permit = match semaphore.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => break,
        };

        if tx.is_closed() {
            tracing::warn!("Consumer stopped, no further fetches will be dispatched");
            break;
        }

        let client = client.clone();
        let tx = tx.clone();
        tasks.spawn(async move {
            let _permit = permit;
            tokio::time::sleep(delay).await;

            let result = fetch_document(&client, &url).await;
            match &result {
                FetchResult::Success { final_url, .. } if *final_url != url => {
                    tracing::debug!("Fetched {} (redirected to {})", url, final_url)
                }
                FetchResult::Success { .. } => tracing::debug!("Fetched {}", url),
                failed => tracing::warn!(
                    "Error fetching {}: {}",
                    url,
                    failed.failure_reason().unwrap_or_default()
                ),
            }

            tx.send(FetchedDocument {
                source_url: url,
                result,
            })
            .await
            .is_ok()
        });
    }

    drop(tx);

    let mut delivered = 0;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(true) => delivered += 1,
            Ok(false) => {
                tracing::debug!("Consumer gone, aborting remaining fetches");
                tasks.abort_all();
            }
            Err(e) if e.is_cancelled() => {}
            Err(e) => tracing::error!("Fetch task panicked: {}", e),
        }
    }

    delivered
}

//! Listing page rendering
//!
//! The catalog's listing page only reveals more results when its "load more"
//! control is clicked, so it has to be driven by a real browser. [`Renderer`]
//! is the seam the discoverer talks to; [`ChromeRenderer`] implements it on top
//! of a headless Chrome session.

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// CSS class of the listing's "load more" button
pub const LOAD_MORE_SELECTOR: &str = ".ipc-see-more__button";

/// Class added to `<body>` once pagination has finished
pub const DONE_MARKER_CLASS: &str = "done-loading-result";

const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Errors raised while rendering a listing
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Failed to start browser: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Timed out waiting for '{selector}'")]
    WaitTimeout { selector: String },

    #[error("Failed to capture page content: {0}")]
    Capture(String),
}

/// How far to paginate a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationPlan {
    /// Selector of the control that loads the next page of results
    pub load_more_selector: String,

    /// Class set on `<body>` when pagination is finished
    pub done_marker_class: String,

    /// Maximum number of "load more" clicks
    pub max_clicks: usize,

    /// Pause between clicks
    pub click_interval: Duration,

    /// How long to wait for the control to appear at all
    pub load_more_wait: Duration,
}

impl PaginationPlan {
    /// Plans just enough clicks to reveal `max_results` items
    ///
    /// The first page is visible without clicking, so a cap that fits on one
    /// page needs no clicks at all.
    pub fn for_cap(
        max_results: usize,
        results_per_page: usize,
        click_interval: Duration,
        load_more_wait: Duration,
    ) -> Self {
        Self {
            load_more_selector: LOAD_MORE_SELECTOR.to_string(),
            done_marker_class: DONE_MARKER_CLASS.to_string(),
            max_clicks: pages_needed(max_results, results_per_page).saturating_sub(1),
            click_interval,
            load_more_wait,
        }
    }

    /// Injected script that clicks "load more" until the control vanishes or
    /// the click budget is spent, then marks the document as done
    pub fn script(&self) -> String {
        format!(
            r#"
            (() => {{
                const selector = {selector:?};
                const maxClicks = {max_clicks};
                let clicks = 0;
                function loadMore() {{
                    const button = document.querySelector(selector);
                    if (button) {{
                        button.click();
                        return true;
                    }}
                    return false;
                }}
                function step() {{
                    if (clicks < maxClicks && loadMore()) {{
                        clicks++;
                        setTimeout(step, {interval});
                    }} else {{
                        document.body.classList.add({marker:?});
                    }}
                }}
                step();
                return true;
            }})()
            "#,
            selector = self.load_more_selector,
            max_clicks = self.max_clicks,
            interval = self.click_interval.as_millis(),
            marker = self.done_marker_class,
        )
    }
}

/// Number of listing pages that hold `max_results` items
pub fn pages_needed(max_results: usize, results_per_page: usize) -> usize {
    max_results.div_ceil(results_per_page.max(1))
}

/// Something that can turn a listing URL into its fully paginated markup
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigates to `url`, paginates according to `plan` and returns the
    /// rendered document
    async fn render_listing(&self, url: &str, plan: &PaginationPlan) -> Result<String, RenderError>;
}

/// Renderer backed by a Chrome/Chromium browser over the DevTools protocol
#[derive(Debug, Clone)]
pub struct ChromeRenderer {
    headless: bool,
}

impl ChromeRenderer {
    pub fn new(headless: bool) -> Self {
        Self { headless }
    }
}

/// The browser operations pagination needs from an open listing tab
#[async_trait]
pub(crate) trait ListingPage: Send + Sync {
    /// Waits for the initial navigation to finish
    async fn wait_loaded(&self) -> Result<(), String>;

    /// Evaluates a boolean expression; anything non-boolean counts as false
    async fn check(&self, expression: &str) -> Result<bool, RenderError>;

    /// Runs a script for its side effects
    async fn run_script(&self, script: String) -> Result<(), RenderError>;

    /// Serializes the current document
    async fn html(&self) -> Result<String, RenderError>;
}

#[async_trait]
impl ListingPage for Page {
    async fn wait_loaded(&self) -> Result<(), String> {
        self.wait_for_navigation()
            .await
            .map(|_| ())
            .map_err(|e| e.to_string())
    }

    async fn check(&self, expression: &str) -> Result<bool, RenderError> {
        Ok(self
            .evaluate(expression)
            .await
            .map_err(|e| RenderError::Script(e.to_string()))?
            .into_value::<bool>()
            .unwrap_or(false))
    }

    async fn run_script(&self, script: String) -> Result<(), RenderError> {
        self.evaluate(script)
            .await
            .map(|_| ())
            .map_err(|e| RenderError::Script(e.to_string()))
    }

    async fn html(&self) -> Result<String, RenderError> {
        self.content()
            .await
            .map_err(|e| RenderError::Capture(e.to_string()))
    }
}

/// Expression that is true while the "load more" control is on screen
fn control_visible_check(plan: &PaginationPlan) -> String {
    format!(
        "(() => {{ const el = document.querySelector({:?}); return !!el && el.offsetParent !== null; }})()",
        plan.load_more_selector
    )
}

/// Expression that is true once the pagination script has finished
fn done_check(plan: &PaginationPlan) -> String {
    format!(
        "document.body.classList.contains({:?})",
        plan.done_marker_class
    )
}

/// Paginates an open listing tab and returns its markup
///
/// A control that never shows up within `load_more_wait` means the listing
/// fits on one page; the script still runs and sets the done marker at once.
pub(crate) async fn paginate<P: ListingPage + ?Sized>(
    page: &P,
    url: &str,
    plan: &PaginationPlan,
) -> Result<String, RenderError> {
    page.wait_loaded()
        .await
        .map_err(|message| RenderError::Navigation {
            url: url.to_string(),
            message,
        })?;

    if wait_until(page, &control_visible_check(plan), plan.load_more_wait).await? {
        tracing::debug!("Load-more control visible, paginating up to {} clicks", plan.max_clicks);
    } else {
        tracing::info!(
            "No load-more control within {:?}, treating {} as a single page",
            plan.load_more_wait,
            url
        );
    }

    page.run_script(plan.script()).await?;

    // Two intervals per planned click, plus the initial wait.
    let pagination_budget =
        plan.click_interval * (plan.max_clicks as u32 + 1) * 2 + plan.load_more_wait;
    if !wait_until(page, &done_check(plan), pagination_budget).await? {
        return Err(RenderError::WaitTimeout {
            selector: format!(".{}", plan.done_marker_class),
        });
    }

    page.html().await
}

/// Polls a boolean expression until it is true or `limit` elapses
async fn wait_until<P: ListingPage + ?Sized>(
    page: &P,
    expression: &str,
    limit: Duration,
) -> Result<bool, RenderError> {
    let started = Instant::now();
    loop {
        if page.check(expression).await? {
            return Ok(true);
        }
        if started.elapsed() >= limit {
            return Ok(false);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

#[async_trait]
impl Renderer for ChromeRenderer {
    async fn render_listing(&self, url: &str, plan: &PaginationPlan) -> Result<String, RenderError> {
        let mut builder = BrowserConfig::builder();
        if !self.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(RenderError::Launch)?;

        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RenderError::Launch(e.to_string()))?;

        let handler_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler event error: {}", e);
                }
            }
        });

        tracing::info!("Rendering listing {}", url);
        let rendered = match browser.new_page(url).await {
            Ok(page) => paginate(&page, url, plan).await,
            Err(e) => Err(RenderError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
        };

        if let Err(e) = browser.close().await {
            tracing::warn!("Failed to close browser: {} (non-fatal)", e);
        }
        handler_task.abort();

        rendered
    }
}

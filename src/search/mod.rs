//! Search filters and catalog URL construction
//!
//! A [`SearchFilter`] carries the user's category and keyword. The functions
//! here turn it into the listing URL the discoverer renders, resolve item
//! hrefs found on that listing, and fetch the catalog's genre list used to
//! validate categories.

use crate::harvest::{fetch_document, parse_genres, FetchResult};
use crate::{HarvestError, Result};
use reqwest::Client;
use url::form_urlencoded::byte_serialize;
use url::Url;

/// Category and keyword constraints for one harvest
///
/// Empty strings mean "no constraint". A non-empty category must be one of
/// the catalog's genres; this is checked once, at construction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchFilter {
    category: String,
    keyword: String,
}

impl SearchFilter {
    /// Builds a filter, rejecting a category the catalog does not list
    ///
    /// # Arguments
    ///
    /// * `category` - Genre name (case sensitive) or empty for all genres
    /// * `keyword` - Free-text keyword or empty for none
    /// * `genres` - Genre names previously fetched from the catalog
    ///
    /// # Returns
    ///
    /// * `Ok(SearchFilter)` - The validated filter
    /// * `Err(HarvestError::UnknownCategory)` - The category is not a catalog genre
    pub fn new(
        category: impl Into<String>,
        keyword: impl Into<String>,
        genres: &[String],
    ) -> Result<Self> {
        let category = category.into().trim().to_string();
        let keyword = keyword.into().trim().to_string();

        if !category.is_empty() && !genres.iter().any(|g| *g == category) {
            return Err(HarvestError::UnknownCategory { category });
        }

        Ok(Self { category, keyword })
    }

    /// Builds a keyword-only filter, which needs no genre list
    pub fn keyword_only(keyword: impl Into<String>) -> Self {
        Self {
            category: String::new(),
            keyword: keyword.into().trim().to_string(),
        }
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }
}

fn encode(value: &str) -> String {
    byte_serialize(value.as_bytes()).collect()
}

fn base_str(base_url: &Url) -> &str {
    base_url.as_str().trim_end_matches('/')
}

/// Builds the listing URL for a filter
///
/// Every parameter is always present; an empty category or keyword becomes an
/// empty query value.
///
/// # Example
///
/// ```
/// use reel_harvest::search::{listing_url, SearchFilter};
/// use url::Url;
///
/// let base = Url::parse("https://www.imdb.com").unwrap();
/// let filter = SearchFilter::keyword_only("dune");
/// assert_eq!(
///     listing_url(&base, "feature", &filter),
///     "https://www.imdb.com/search/title/?title_type=feature&genres=&keywords=dune"
/// );
/// ```
pub fn listing_url(base_url: &Url, title_type: &str, filter: &SearchFilter) -> String {
    format!(
        "{}/search/title/?title_type={}&genres={}&keywords={}",
        base_str(base_url),
        encode(title_type),
        encode(filter.category()),
        encode(filter.keyword())
    )
}

/// URL of the unfiltered search page that carries the genre facet
pub fn genre_list_url(base_url: &Url) -> String {
    format!("{}/search/title/", base_str(base_url))
}

/// Resolves an item anchor href against the catalog base
///
/// Relative hrefs are appended to the base the same way [`listing_url`]
/// builds its path, so a base with a path prefix keeps that prefix. Absolute
/// hrefs are taken as they are. Returns None for empty hrefs and anything that
/// does not end up as an http(s) URL.
pub fn item_url(base_url: &Url, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }

    let candidate = match Url::parse(href) {
        Ok(absolute) => absolute,
        Err(url::ParseError::RelativeUrlWithoutBase) => {
            let joined = format!("{}/{}", base_str(base_url), href.trim_start_matches('/'));
            Url::parse(&joined).ok()?
        }
        Err(_) => return None,
    };

    match candidate.scheme() {
        "http" | "https" => Some(candidate.to_string()),
        _ => None,
    }
}

/// Fetches the catalog's genre names
///
/// # Returns
///
/// * `Ok(Vec<String>)` - Genre labels in page order, quirks stripped
/// * `Err(HarvestError)` - The genre page could not be retrieved
pub async fn fetch_genres(client: &Client, base_url: &Url) -> Result<Vec<String>> {
    let url = genre_list_url(base_url);
    tracing::debug!("Fetching genre list from {}", url);

    match fetch_document(client, &url).await {
        FetchResult::Success { body, .. } => {
            let genres = parse_genres(&body)?;
            tracing::info!("Catalog lists {} genres", genres.len());
            Ok(genres)
        }
        FetchResult::HttpError { status_code } => Err(HarvestError::HttpStatus {
            url,
            status: status_code,
        }),
        FetchResult::NetworkError { error } => Err(HarvestError::Fetch {
            url,
            message: error,
        }),
    }
}

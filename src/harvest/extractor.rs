//! Movie field extraction
//!
//! This module turns an item page into a [`Record`]. Extraction is best-effort
//! per field: a selector that matches nothing leaves that field at its zero
//! value and never affects the others.

use crate::{HarvestError, Result};
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};

/// Movie title, the natural key
pub const NAME_SELECTOR: &str = r#"h1[data-testid="hero__pageTitle"] span"#;

/// Aggregate user rating
pub const RATING_SELECTOR: &str =
    r#"div[data-testid="hero-rating-bar__aggregate-rating__score"] span:first-child"#;

/// Release year, first entry of the metadata list under the title
pub const RELEASED_YEAR_SELECTOR: &str =
    r#"h1[data-testid="hero__pageTitle"] ~ ul > li:first-child a"#;

/// Plot summary
pub const SUMMARY_SELECTOR: &str = r#"p[data-testid="plot"] span:first-child"#;

/// Director entries: first principal credit row
pub const DIRECTORS_SELECTOR: &str =
    r#"li[data-testid="title-pc-principal-credit"]:nth-child(1) ul > li"#;

/// Cast entries: third principal credit row (stars)
pub const CAST_SELECTOR: &str =
    r#"li[data-testid="title-pc-principal-credit"]:nth-child(3) ul > li"#;

/// Genre buttons of the search page's genre facet
pub const GENRE_SELECTOR: &str = "#accordion-item-genreAccordion button";

/// A harvested movie
///
/// Every field may be empty when the page lacked the corresponding node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub name: String,
    pub released_year: String,
    pub rating: String,
    pub summary: String,
    pub directors: Vec<String>,
    pub cast: Vec<String>,
}

impl Record {
    /// A record without a name cannot be keyed and is never stored
    pub fn has_name(&self) -> bool {
        !self.name.is_empty()
    }
}

/// Compiled selectors for item pages
#[derive(Debug, Clone)]
pub struct Extractor {
    name: Selector,
    rating: Selector,
    released_year: Selector,
    summary: Selector,
    directors: Selector,
    cast: Selector,
    anchor: Selector,
}

impl Extractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            name: compile(NAME_SELECTOR)?,
            rating: compile(RATING_SELECTOR)?,
            released_year: compile(RELEASED_YEAR_SELECTOR)?,
            summary: compile(SUMMARY_SELECTOR)?,
            directors: compile(DIRECTORS_SELECTOR)?,
            cast: compile(CAST_SELECTOR)?,
            anchor: compile("a")?,
        })
    }

    /// Extracts a record from raw item page markup
    ///
    /// # Example
    ///
    /// ```
    /// use reel_harvest::harvest::Extractor;
    ///
    /// let html = r#"<h1 data-testid="hero__pageTitle"><span>Dune</span></h1>"#;
    /// let record = Extractor::new().unwrap().extract(html);
    /// assert_eq!(record.name, "Dune");
    /// assert!(record.cast.is_empty());
    /// ```
    pub fn extract(&self, html: &str) -> Record {
        let document = Html::parse_document(html);

        Record {
            name: first_text(&document, &self.name),
            released_year: first_text(&document, &self.released_year),
            rating: first_text(&document, &self.rating),
            summary: first_text(&document, &self.summary),
            directors: self.anchor_texts(&document, &self.directors),
            cast: self.anchor_texts(&document, &self.cast),
        }
    }

    /// Text of each matching node's first anchor, in document order
    fn anchor_texts(&self, document: &Html, selector: &Selector) -> Vec<String> {
        document
            .select(selector)
            .filter_map(|node| node.select(&self.anchor).next())
            .map(|anchor| element_text(&anchor))
            .collect()
    }
}

/// Compiles a CSS selector, reporting the offending text on failure
pub(crate) fn compile(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| HarvestError::Selector {
        selector: selector.to_string(),
        message: format!("{:?}", e),
    })
}

fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn first_text(document: &Html, selector: &Selector) -> String {
    document
        .select(selector)
        .next()
        .map(|element| element_text(&element))
        .unwrap_or_default()
}

/// Removes the stray count digit the catalog renders after genre labels
///
/// The facet renders some labels as e.g. `"Action0"`; a single trailing `0`
/// is not part of the name.
pub fn clean_genre_label(label: &str) -> String {
    let label = label.trim();
    label.strip_suffix('0').unwrap_or(label).trim_end().to_string()
}

/// Extracts genre names from the search page's genre facet
pub fn parse_genres(html: &str) -> Result<Vec<String>> {
    let document = Html::parse_document(html);
    let buttons = compile(GENRE_SELECTOR)?;
    let label = compile("span")?;

    Ok(document
        .select(&buttons)
        .filter_map(|button| button.select(&label).next())
        .map(|span| clean_genre_label(&element_text(&span)))
        .filter(|genre| !genre.is_empty())
        .collect())
}

//! Traversal-based extraction (funda).
//!
//! Listings are not wrapped in a single card element. Each one starts at a
//! street-name marker, and its remaining fields are the nearest matching
//! elements that follow the marker in document order. The detail link is the
//! nearest `<a>` that encloses the marker.

use scraper::{ElementRef, Html, Selector};

use super::{Canonicalizer, ExtractedListing, ListingFields};
use crate::{ScrapeError, element_text, parse_selector};

const MARKER: &str = "div[data-test-id='street-name-house-number'], \
                      h2[data-test-id='street-name-house-number']";
const POSTAL_CODE_CITY: &str = "div[data-test-id='postal-code-city']";
const PRICE: &str = "p[data-test-id='price-rent']";
const FEATURE: &str = "li";
const AGENT: &str = "a[href*='makelaars']";

/// Extracts listings by walking the document from each street-name marker.
#[derive(Debug, Clone)]
pub struct TraversalExtractor {
    canonicalizer: Canonicalizer,
    marker: Selector,
    postal_code_city: Selector,
    price: Selector,
    feature: Selector,
    agent: Selector,
}

impl TraversalExtractor {
    /// Compiles the marker and field selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Selector`] if a selector fails to compile.
    pub fn new(canonicalizer: Canonicalizer) -> Result<Self, ScrapeError> {
        Ok(Self {
            canonicalizer,
            marker: parse_selector(MARKER)?,
            postal_code_city: parse_selector(POSTAL_CODE_CITY)?,
            price: parse_selector(PRICE)?,
            feature: parse_selector(FEATURE)?,
            agent: parse_selector(AGENT)?,
        })
    }

    /// Extracts every complete listing, in marker order.
    #[must_use]
    pub fn extract_all(&self, document: &Html) -> Vec<ExtractedListing> {
        document
            .select(&self.marker)
            .map(|marker| self.fields(document, marker))
            .filter_map(|fields| self.canonicalizer.canonicalize(fields))
            .collect()
    }

    /// Reads the raw fields belonging to one street-name marker.
    #[must_use]
    pub fn fields(&self, document: &Html, marker: ElementRef<'_>) -> ListingFields {
        let next_matching =
            |selector: &Selector| following(document, marker).find(|el| selector.matches(el));

        let size = next_matching(&self.feature);
        let rooms = size.and_then(|size| {
            size.next_siblings()
                .filter_map(ElementRef::wrap)
                .find(|el| el.value().name() == "li")
        });

        let link = marker
            .ancestors()
            .filter_map(ElementRef::wrap)
            .find(|el| el.value().name() == "a")
            .and_then(|a| a.value().attr("href"))
            .map(str::to_owned);

        ListingFields {
            street_name: Some(element_text(marker)),
            postal_code_city: next_matching(&self.postal_code_city).map(element_text),
            price: next_matching(&self.price).map(element_text),
            size: size.map(element_text),
            rooms: rooms.map(element_text),
            agent: next_matching(&self.agent).map(element_text),
            link,
        }
    }
}

/// Elements after `marker` in document order (its own descendants first).
fn following<'a>(document: &'a Html, marker: ElementRef<'a>) -> impl Iterator<Item = ElementRef<'a>> {
    let marker_id = marker.id();
    document
        .tree
        .root()
        .descendants()
        .skip_while(move |node| node.id() != marker_id)
        .skip(1)
        .filter_map(ElementRef::wrap)
}

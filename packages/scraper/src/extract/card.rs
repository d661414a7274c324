//! Card-based extraction (pararius).
//!
//! Each listing is a self-contained `.listing-search-item` element whose
//! fields are found by CSS selection inside the card.

use scraper::{ElementRef, Html, Selector};

use super::{Canonicalizer, ExtractedListing, ListingFields};
use crate::address::drop_first_word;
use crate::{ScrapeError, element_text, parse_selector};

const CARD: &str = ".listing-search-item";
const TITLE_LINK: &str = ".listing-search-item__title a";
const SUB_TITLE: &str = "[class^='listing-search-item__sub-title']";
const PRICE: &str = ".listing-search-item__price";
const FEATURE: &str = ".illustrated-features__item";
const AGENT: &str = ".listing-search-item__info a";

/// Class of the postal-code line. The site has been seen to render it with
/// a stray trailing apostrophe, which is tolerated.
const SUB_TITLE_CLASS: &str = "listing-search-item__sub-title";

/// Extracts listings from self-contained result cards.
#[derive(Debug, Clone)]
pub struct CardExtractor {
    canonicalizer: Canonicalizer,
    card: Selector,
    title_link: Selector,
    sub_title: Selector,
    price: Selector,
    feature: Selector,
    agent: Selector,
}

impl CardExtractor {
    /// Compiles the card selectors.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Selector`] if a selector fails to compile.
    pub fn new(canonicalizer: Canonicalizer) -> Result<Self, ScrapeError> {
        Ok(Self {
            canonicalizer,
            card: parse_selector(CARD)?,
            title_link: parse_selector(TITLE_LINK)?,
            sub_title: parse_selector(SUB_TITLE)?,
            price: parse_selector(PRICE)?,
            feature: parse_selector(FEATURE)?,
            agent: parse_selector(AGENT)?,
        })
    }

    /// Extracts every complete listing card, in document order.
    #[must_use]
    pub fn extract_all(&self, document: &Html) -> Vec<ExtractedListing> {
        document
            .select(&self.card)
            .map(|card| self.fields(card))
            .filter_map(|fields| self.canonicalizer.canonicalize(fields))
            .collect()
    }

    /// Reads the raw fields of one card.
    #[must_use]
    pub fn fields(&self, card: ElementRef<'_>) -> ListingFields {
        let title_link = card.select(&self.title_link).next();

        let postal_code_city = card
            .select(&self.sub_title)
            .find(|el| {
                el.value()
                    .classes()
                    .next()
                    .is_some_and(|class| class.trim_end_matches('\'') == SUB_TITLE_CLASS)
            })
            .map(element_text);

        let mut features = card.select(&self.feature).map(element_text);
        let size = features.next();
        let rooms = features.next();

        ListingFields {
            street_name: title_link.map(|el| drop_first_word(&element_text(el))),
            postal_code_city,
            price: card.select(&self.price).next().map(element_text),
            size,
            rooms,
            agent: card.select(&self.agent).next().map(element_text),
            link: title_link
                .and_then(|el| el.value().attr("href"))
                .map(str::to_owned),
        }
    }
}

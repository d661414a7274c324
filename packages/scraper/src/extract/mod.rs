//! Per-site record extraction.
//!
//! The two supported sites structure their result pages differently, so
//! there are two strategies:
//!
//! - [`CardExtractor`] reads self-contained listing cards via CSS selection.
//! - [`TraversalExtractor`] starts from an address marker element and walks
//!   the document to the nearest following price/size/room nodes and the
//!   nearest enclosing link.
//!
//! Both produce [`ListingFields`], which [`Canonicalizer`] turns into an
//! [`ExtractedListing`]. Listings without a street name or a resolvable
//! link are dropped here and never reach the caller.

pub mod card;
pub mod traversal;

use apartment_watch_source_models::ApartmentRecord;
use reqwest::Url;
use scraper::Html;
use serde::Deserialize;

use crate::ScrapeError;
use crate::address::{compose_address, map_link};

pub use card::CardExtractor;
pub use traversal::TraversalExtractor;

/// Which extraction strategy a site uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractorKind {
    /// Self-contained listing cards selected by CSS class.
    CardBased,
    /// Marker elements with related nodes found by document traversal.
    TraversalBased,
}

/// Raw fields pulled out of one listing fragment, before canonicalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingFields {
    /// Street and house number.
    pub street_name: Option<String>,
    /// Postal code and city line.
    pub postal_code_city: Option<String>,
    /// Displayed price.
    pub price: Option<String>,
    /// Displayed living area.
    pub size: Option<String>,
    /// Displayed room count.
    pub rooms: Option<String>,
    /// Letting agent name.
    pub agent: Option<String>,
    /// Link to the detail page, possibly relative to the site.
    pub link: Option<String>,
}

/// A canonical record together with the address it was derived from.
///
/// The address is kept alongside the record because travel-time lookup
/// needs it after dedup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedListing {
    /// The composed `"<street>, <postal + city>, <city>"` address.
    pub address: String,
    /// The canonical record.
    pub record: ApartmentRecord,
}

/// Turns [`ListingFields`] into canonical records for one site.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    site_url: Url,
    city: String,
}

impl Canonicalizer {
    /// Creates a canonicalizer resolving links against `site_url` and
    /// appending `city` to every composed address.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Url`] if `site_url` is not an absolute URL.
    pub fn new(site_url: &str, city: &str) -> Result<Self, ScrapeError> {
        let site_url = Url::parse(site_url).map_err(|e| ScrapeError::Url {
            url: site_url.to_owned(),
            message: e.to_string(),
        })?;

        Ok(Self {
            site_url,
            city: city.to_owned(),
        })
    }

    /// Builds the canonical listing, or `None` when the street name or the
    /// detail link is missing.
    #[must_use]
    pub fn canonicalize(&self, fields: ListingFields) -> Option<ExtractedListing> {
        let street_name = fields.street_name.filter(|s| !s.trim().is_empty())?;
        let Some(detail_link) = fields.link.as_deref().and_then(|href| self.resolve(href)) else {
            log::debug!("Skipping '{street_name}': no resolvable detail link");
            return None;
        };

        let address = compose_address(&street_name, fields.postal_code_city.as_deref(), &self.city);

        Some(ExtractedListing {
            record: ApartmentRecord {
                street_name,
                travel_minutes: None,
                price: fields.price.unwrap_or_default(),
                size: fields.size.unwrap_or_default(),
                rooms: fields.rooms.unwrap_or_default(),
                agent: fields.agent.filter(|a| !a.is_empty()),
                detail_link,
                map_link: map_link(&address),
            },
            address,
        })
    }

    fn resolve(&self, href: &str) -> Option<String> {
        let href = href.trim();
        if href.is_empty() {
            return None;
        }
        self.site_url.join(href).ok().map(String::from)
    }
}

/// A site's extraction strategy.
#[derive(Debug, Clone)]
pub enum Extractor {
    /// See [`CardExtractor`].
    CardBased(CardExtractor),
    /// See [`TraversalExtractor`].
    TraversalBased(TraversalExtractor),
}

impl Extractor {
    /// Builds the extractor for `kind`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] if `site_url` is invalid or a selector fails
    /// to compile.
    pub fn new(kind: ExtractorKind, site_url: &str, city: &str) -> Result<Self, ScrapeError> {
        let canonicalizer = Canonicalizer::new(site_url, city)?;
        Ok(match kind {
            ExtractorKind::CardBased => Self::CardBased(CardExtractor::new(canonicalizer)?),
            ExtractorKind::TraversalBased => {
                Self::TraversalBased(TraversalExtractor::new(canonicalizer)?)
            }
        })
    }

    /// Returns the strategy kind.
    #[must_use]
    pub const fn kind(&self) -> ExtractorKind {
        match self {
            Self::CardBased(_) => ExtractorKind::CardBased,
            Self::TraversalBased(_) => ExtractorKind::TraversalBased,
        }
    }

    /// Extracts every complete listing from `document`, in document order.
    #[must_use]
    pub fn extract_all(&self, document: &Html) -> Vec<ExtractedListing> {
        match self {
            Self::CardBased(extractor) => extractor.extract_all(document),
            Self::TraversalBased(extractor) => extractor.extract_all(document),
        }
    }
}

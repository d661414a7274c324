//! Dedup boundary against a source's known records.
//!
//! Sites list results newest first, so the first already-known listing on a
//! page marks the point where everything after it was seen on a previous
//! run. [`dedup_boundary`] keeps the listings before that point and reports
//! that the boundary was reached.

use std::collections::HashSet;

use apartment_watch_scraper::extract::ExtractedListing;
use apartment_watch_source_models::ApartmentRecord;

/// A source's previously recorded records plus a lookup set of their street
/// names.
///
/// Built once per source at the start of a run and only read afterwards.
#[derive(Debug, Clone, Default)]
pub struct KnownSet {
    records: Vec<ApartmentRecord>,
    street_names: HashSet<String>,
}

impl KnownSet {
    /// Builds the lookup set over `records`, keeping their order.
    #[must_use]
    pub fn from_records(records: Vec<ApartmentRecord>) -> Self {
        let street_names = records.iter().map(|r| r.street_name.clone()).collect();
        Self {
            records,
            street_names,
        }
    }

    /// Returns `true` if `street_name` was recorded before.
    #[must_use]
    pub fn contains(&self, street_name: &str) -> bool {
        self.street_names.contains(street_name)
    }

    /// Number of known records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if nothing is known yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The known records, in stored order.
    #[must_use]
    pub fn records(&self) -> &[ApartmentRecord] {
        &self.records
    }

    /// Consumes the set, returning the known records in stored order.
    #[must_use]
    pub fn into_records(self) -> Vec<ApartmentRecord> {
        self.records
    }
}

/// New listings found on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageResult {
    /// Listings preceding the first known one, in document order.
    pub listings: Vec<ExtractedListing>,
    /// Whether a known listing was encountered on this page.
    pub reached_known: bool,
}

/// Keeps the listings that precede the first known street name.
#[must_use]
pub fn dedup_boundary(listings: Vec<ExtractedListing>, known: &KnownSet) -> PageResult {
    let mut result = PageResult::default();

    for listing in listings {
        if known.contains(&listing.record.street_name) {
            log::debug!(
                "Reached known listing '{}', stopping",
                listing.record.street_name
            );
            result.reached_known = true;
            break;
        }
        result.listings.push(listing);
    }

    result
}

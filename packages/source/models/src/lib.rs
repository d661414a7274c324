#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Listing source identifiers and the canonical apartment record.
//!
//! Every listing site produces [`ApartmentRecord`]s after extraction, so the
//! rest of the pipeline (dedup, merge, persistence) never needs to know which
//! markup a record came from.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Column headers of the persisted record table, in output order.
pub const OUTPUT_COLUMNS: [&str; 8] = [
    "Street Name",
    "Min to Booking",
    "Price",
    "Size (m²)",
    "Rooms",
    "Agent",
    "Detail Link",
    "Google Maps Link",
];

/// A listing website the pipeline knows how to crawl.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SourceId {
    /// funda.nl
    Funda,
    /// pararius.com
    Pararius,
}

impl SourceId {
    /// All known sources, in crawl order.
    pub const ALL: &[Self] = &[Self::Funda, Self::Pararius];
}

/// One apartment listing normalized to the canonical schema.
///
/// Field names serialize to the [`OUTPUT_COLUMNS`] headers so that a record
/// round-trips through any tabular store unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApartmentRecord {
    /// Street and house number. Unique within a source's known set.
    #[serde(rename = "Street Name")]
    pub street_name: String,
    /// Transit minutes to the configured destination, if it could be resolved.
    #[serde(rename = "Min to Booking")]
    pub travel_minutes: Option<u32>,
    /// Price as displayed by the site (currency and period not normalized).
    #[serde(rename = "Price")]
    pub price: String,
    /// Living area as displayed by the site.
    #[serde(rename = "Size (m²)")]
    pub size: String,
    /// Room count as displayed by the site.
    #[serde(rename = "Rooms")]
    pub rooms: String,
    /// Letting agent, when the listing names one.
    #[serde(rename = "Agent")]
    pub agent: Option<String>,
    /// Absolute URL of the listing detail page.
    #[serde(rename = "Detail Link")]
    pub detail_link: String,
    /// Map search URL derived from the composed address.
    #[serde(rename = "Google Maps Link")]
    pub map_link: String,
}

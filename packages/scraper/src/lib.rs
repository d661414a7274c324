#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Page fetching and record extraction for apartment listing sites.
//!
//! Provides the [`fetch::PageFetcher`] trait with an HTTP implementation
//! ([`fetch::HttpPageFetcher`]) and the per-site [`extract::Extractor`]
//! strategies that turn a parsed listing page into canonical
//! [`ApartmentRecord`](apartment_watch_source_models::ApartmentRecord)s.
//!
//! This crate has no knowledge of known records or persistence. It fetches
//! markup and extracts whatever listings it can find.

pub mod address;
pub mod extract;
pub mod fetch;
pub mod retry;

use scraper::{ElementRef, Selector};

/// Errors that can occur while fetching or preparing to parse a page.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// An HTTP request failed at the transport level.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}")]
    Status {
        /// The requested URL.
        url: String,
        /// The status returned by the server.
        status: reqwest::StatusCode,
    },

    /// A CSS selector failed to compile.
    #[error("invalid CSS selector '{selector}': {message}")]
    Selector {
        /// The selector source text.
        selector: String,
        /// The parser's description of the problem.
        message: String,
    },

    /// A configured URL could not be parsed.
    #[error("invalid URL '{url}': {message}")]
    Url {
        /// The offending URL.
        url: String,
        /// The parser's description of the problem.
        message: String,
    },
}

/// Parses a CSS selector string, returning a [`ScrapeError`] on failure.
///
/// # Errors
///
/// Returns [`ScrapeError::Selector`] if the selector is not valid CSS.
pub fn parse_selector(selector: &str) -> Result<Selector, ScrapeError> {
    Selector::parse(selector).map_err(|e| ScrapeError::Selector {
        selector: selector.to_owned(),
        message: e.to_string(),
    })
}

/// Returns the text content of an element with runs of whitespace collapsed
/// to single spaces and the ends trimmed.
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

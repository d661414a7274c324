#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions)]

//! Listing site definitions and the contracts the crawl pipeline consumes.
//!
//! Each supported site is described by an embedded TOML file (see
//! [`registry`]) and resolved into a [`site_def::SiteAdapter`] that knows
//! its page URLs and extraction strategy. The collaborator traits
//! ([`store::KnownStore`], [`travel::TravelTimeResolver`],
//! [`notify::Notifier`]) are implemented by separate crates so the pipeline
//! never depends on a particular backend.

pub mod notify;
pub mod progress;
pub mod registry;
pub mod site_def;
pub mod store;
pub mod travel;

/// Errors raised while assembling the run configuration.
///
/// These are always detected at startup, before any page is fetched.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The source identifier does not name a configured site.
    #[error("Unknown source: {id}")]
    UnknownSource {
        /// The identifier that was requested.
        id: String,
    },

    /// An environment variable is set but cannot be parsed.
    #[error("Invalid value for {name}: {message}")]
    InvalidEnv {
        /// Name of the variable.
        name: String,
        /// Description of what went wrong.
        message: String,
    },

    /// Only part of a credential group was provided.
    #[error("Incomplete {group} credentials: missing {missing}")]
    IncompleteCredentials {
        /// Human-readable name of the credential group.
        group: String,
        /// Comma-separated names of the missing variables.
        missing: String,
    },

    /// A site adapter could not be built (bad URL or selector).
    #[error("Invalid site configuration: {0}")]
    Site(#[from] apartment_watch_scraper::ScrapeError),
}

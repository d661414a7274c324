//! Config-driven listing site definition.
//!
//! [`SiteDefinition`] captures everything unique about a listing site in a
//! serializable struct. [`SiteAdapter`] is the resolved, ready-to-crawl form:
//! the definition with any environment overrides applied and its extraction
//! strategy built.

use std::str::FromStr as _;

use apartment_watch_scraper::extract::{Extractor, ExtractorKind};
use apartment_watch_source_models::SourceId;
use serde::Deserialize;

use crate::ConfigError;
use crate::registry;

/// A listing site as described by its embedded TOML file.
#[derive(Debug, Clone, Deserialize)]
pub struct SiteDefinition {
    /// Source identifier (e.g., `funda`).
    pub id: SourceId,
    /// Human-readable name, used in notifications (e.g., `"Funda"`).
    pub name: String,
    /// Site root that relative detail links are resolved against.
    pub site_url: String,
    /// Default search results URL (page 1 without the page parameter).
    pub search_url: String,
    /// Default page-parameter template appended before the page number.
    pub page_param: String,
    /// City appended to every composed address.
    pub city: String,
    /// Which extraction strategy the site's markup needs.
    pub extractor: ExtractorKind,
}

/// Parses a site definition from TOML.
///
/// # Errors
///
/// Returns [`toml::de::Error`] if the TOML is malformed or missing fields.
pub fn parse_site_toml(toml_str: &str) -> Result<SiteDefinition, toml::de::Error> {
    toml::from_str(toml_str)
}

/// Operator-supplied replacements for a site's search URL and page template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteOverrides {
    /// Replacement search URL.
    pub search_url: Option<String>,
    /// Replacement page-parameter template.
    pub page_param: Option<String>,
}

/// A resolved site: URLs and extraction strategy for one crawl.
#[derive(Debug, Clone)]
pub struct SiteAdapter {
    id: SourceId,
    name: String,
    search_url: String,
    page_param: String,
    extractor: Extractor,
}

impl SiteAdapter {
    /// Resolves `definition` with `overrides` applied.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Site`] if the extractor cannot be built.
    pub fn from_definition(
        definition: &SiteDefinition,
        overrides: &SiteOverrides,
    ) -> Result<Self, ConfigError> {
        let extractor = Extractor::new(definition.extractor, &definition.site_url, &definition.city)?;

        Ok(Self {
            id: definition.id,
            name: definition.name.clone(),
            search_url: overrides
                .search_url
                .clone()
                .unwrap_or_else(|| definition.search_url.clone()),
            page_param: overrides
                .page_param
                .clone()
                .unwrap_or_else(|| definition.page_param.clone()),
            extractor,
        })
    }

    /// Returns the source identifier.
    #[must_use]
    pub const fn id(&self) -> SourceId {
        self.id
    }

    /// Returns the human-readable site name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the extraction strategy.
    #[must_use]
    pub const fn extractor(&self) -> &Extractor {
        &self.extractor
    }

    /// Builds the URL of results page `page` (1-based).
    #[must_use]
    pub fn page_url(&self, page: u32) -> String {
        format!("{}{}{page}", self.search_url, self.page_param)
    }
}

/// Resolves a source identifier to its site adapter.
///
/// # Errors
///
/// Returns [`ConfigError::UnknownSource`] if `id` is not a configured site,
/// or [`ConfigError::Site`] if the adapter cannot be built.
pub fn select_site(id: &str, overrides: &SiteOverrides) -> Result<SiteAdapter, ConfigError> {
    let source = SourceId::from_str(id.trim()).map_err(|_| ConfigError::UnknownSource {
        id: id.to_owned(),
    })?;

    let definition = registry::site(source).ok_or_else(|| ConfigError::UnknownSource {
        id: id.to_owned(),
    })?;

    let adapter = SiteAdapter::from_definition(&definition, overrides)?;
    log::debug!(
        "Selected site {} ({:?} extraction)",
        adapter.name(),
        adapter.extractor().kind()
    );
    Ok(adapter)
}

//! Site registry: loads all site definitions from embedded TOML configs.
//!
//! Each `.toml` file in `packages/source/sites/` is baked into the binary at
//! compile time via [`include_str!`].

use apartment_watch_source_models::SourceId;

use crate::site_def::{SiteDefinition, parse_site_toml};

/// TOML configs embedded at compile time.
const SITE_TOMLS: &[(&str, &str)] = &[
    ("funda", include_str!("../sites/funda.toml")),
    ("pararius", include_str!("../sites/pararius.toml")),
];

/// Returns all configured site definitions, parsed from embedded TOML.
///
/// # Panics
///
/// Panics if any TOML config is malformed (the configs are embedded, so this
/// is caught by the registry tests).
#[must_use]
pub fn all_sites() -> Vec<SiteDefinition> {
    SITE_TOMLS
        .iter()
        .map(|(name, toml)| {
            parse_site_toml(toml).unwrap_or_else(|e| panic!("Failed to parse {name}.toml: {e}"))
        })
        .collect()
}

/// Returns the definition of `source`, if one is configured.
#[must_use]
pub fn site(source: SourceId) -> Option<SiteDefinition> {
    all_sites().into_iter().find(|s| s.id == source)
}

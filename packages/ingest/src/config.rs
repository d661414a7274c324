//! Run configuration, read once from the environment at startup.

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use apartment_watch_notify::TwilioOptions;
use apartment_watch_source::ConfigError;
use apartment_watch_source::site_def::{SiteAdapter, SiteOverrides, select_site};
use apartment_watch_source_models::SourceId;

use crate::crawl::{CrawlOptions, DEFAULT_MAX_PAGES, DEFAULT_PAGE_DELAY};

/// Default destination for travel-time lookups.
pub const DEFAULT_DESTINATION: &str = "Booking.com, Oosterdokskade, Amsterdam, Pays-Bas";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default overall deadline for crawling one source.
pub const DEFAULT_SOURCE_DEADLINE: Duration = Duration::from_secs(900);

/// Google Directions access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsOptions {
    /// API key.
    pub api_key: String,
    /// Endpoint override, if any.
    pub endpoint: Option<String>,
}

/// Everything a run needs, assembled once and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestConfig {
    /// Search URL and page template overrides per source.
    pub site_overrides: HashMap<SourceId, SiteOverrides>,
    /// Source identifiers to crawl, or `None` for all of them.
    pub sources: Option<Vec<String>>,
    /// Directory of the CSV store.
    pub data_dir: PathBuf,
    /// Pagination tunables.
    pub crawl: CrawlOptions,
    /// Timeout of a single HTTP request.
    pub request_timeout: Duration,
    /// Overall deadline for one source's crawl.
    pub source_deadline: Duration,
    /// Destination of the travel-time lookups.
    pub destination: String,
    /// Directions access, when a key is configured.
    pub directions: Option<DirectionsOptions>,
    /// SMS delivery, when the full Twilio group is configured.
    pub twilio: Option<TwilioOptions>,
}

impl IngestConfig {
    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric setting does not parse or a
    /// credential group is only partly set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Reads the configuration through `var`, which returns the value of a
    /// variable if it is set.
    ///
    /// Empty values count as unset.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if a numeric setting does not parse or a
    /// credential group is only partly set.
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| var(name).filter(|v| !v.trim().is_empty());

        let mut site_overrides = HashMap::new();
        site_overrides.insert(
            SourceId::Funda,
            SiteOverrides {
                search_url: var("FUNDA_URL"),
                page_param: var("FUNDA_PAGE_PARAM"),
            },
        );
        site_overrides.insert(
            SourceId::Pararius,
            SiteOverrides {
                search_url: var("PARARIUS_URL"),
                page_param: var("PARARIUS_PAGE_PARAM"),
            },
        );

        let sources = var("APARTMENT_WATCH_SOURCES").map(|list| parse_list(&list));

        let data_dir = data_dir_from_vars(&var);

        let max_pages = parse_var(&var, "APARTMENT_WATCH_MAX_PAGES")?.unwrap_or(DEFAULT_MAX_PAGES);
        if max_pages == 0 {
            return Err(ConfigError::InvalidEnv {
                name: "APARTMENT_WATCH_MAX_PAGES".to_string(),
                message: "must be at least 1".to_string(),
            });
        }

        let page_delay = parse_var(&var, "APARTMENT_WATCH_PAGE_DELAY_MS")?
            .map_or(DEFAULT_PAGE_DELAY, Duration::from_millis);
        let request_timeout = parse_var(&var, "APARTMENT_WATCH_REQUEST_TIMEOUT_SECS")?
            .map_or(DEFAULT_REQUEST_TIMEOUT, Duration::from_secs);
        let source_deadline = parse_var(&var, "APARTMENT_WATCH_SOURCE_DEADLINE_SECS")?
            .map_or(DEFAULT_SOURCE_DEADLINE, Duration::from_secs);

        let destination =
            var("APARTMENT_WATCH_DESTINATION").unwrap_or_else(|| DEFAULT_DESTINATION.to_string());

        let directions = var("GOOGLE_API_KEY").map(|api_key| DirectionsOptions {
            api_key,
            endpoint: var("GOOGLE_DIRECTIONS_API_ENDPOINT"),
        });

        let twilio = credential_group(
            "Twilio",
            &[
                ("TWILIO_ACCOUNT_SID", var("TWILIO_ACCOUNT_SID")),
                ("TWILIO_AUTH_TOKEN", var("TWILIO_AUTH_TOKEN")),
                ("TWILIO_FROM_NUMBER", var("TWILIO_FROM_NUMBER")),
                ("TWILIO_TO_NUMBER", var("TWILIO_TO_NUMBER")),
            ],
        )?
        .map(|[account_sid, auth_token, from_number, to_number]| TwilioOptions {
            account_sid,
            auth_token,
            from_number,
            to_number,
        });

        Ok(Self {
            site_overrides,
            sources,
            data_dir,
            crawl: CrawlOptions {
                max_pages,
                page_delay,
            },
            request_timeout,
            source_deadline,
            destination,
            directions,
            twilio,
        })
    }

    /// Resolves the sites to crawl: `filter` if given, else the configured
    /// source list, else every site.
    ///
    /// All identifiers are resolved before anything is fetched.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownSource`] for an identifier that does
    /// not name a configured site.
    pub fn select_sites(&self, filter: Option<&[String]>) -> Result<Vec<SiteAdapter>, ConfigError> {
        let ids: Vec<String> = match filter.or(self.sources.as_deref()) {
            Some(ids) => ids.to_vec(),
            None => SourceId::ALL.iter().map(ToString::to_string).collect(),
        };

        ids.iter()
            .map(|id| {
                let overrides = SourceId::from_str(id.trim())
                    .ok()
                    .and_then(|source| self.site_overrides.get(&source))
                    .cloned()
                    .unwrap_or_default();
                select_site(id, &overrides)
            })
            .collect()
    }
}

/// Reads only the store directory from the process environment.
///
/// Unlike [`IngestConfig::from_env`] this never fails, so read-only commands
/// are not blocked by unrelated settings.
#[must_use]
pub fn data_dir_from_env() -> PathBuf {
    data_dir_from_vars(|name| std::env::var(name).ok())
}

/// Resolves `APARTMENT_WATCH_DATA_DIR` through `var`, falling back to the
/// workspace `data/` directory.
#[must_use]
pub fn data_dir_from_vars(var: impl Fn(&str) -> Option<String>) -> PathBuf {
    var("APARTMENT_WATCH_DATA_DIR")
        .filter(|v| !v.trim().is_empty())
        .map_or_else(apartment_watch_store::paths::data_dir, PathBuf::from)
}

/// Splits a comma-separated list, dropping empty entries.
#[must_use]
pub fn parse_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
        .collect()
}

fn parse_var<T: FromStr>(
    var: impl Fn(&str) -> Option<String>,
    name: &str,
) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    var(name)
        .map(|value| {
            value.trim().parse().map_err(|e: T::Err| ConfigError::InvalidEnv {
                name: name.to_owned(),
                message: e.to_string(),
            })
        })
        .transpose()
}

/// Returns every value of the group, nothing if none is set, or an error
/// naming the missing variables if only some are.
fn credential_group<const N: usize>(
    group: &str,
    vars: &[(&str, Option<String>); N],
) -> Result<Option<[String; N]>, ConfigError> {
    let missing: Vec<&str> = vars
        .iter()
        .filter(|(_, value)| value.is_none())
        .map(|(name, _)| *name)
        .collect();

    if missing.len() == N {
        return Ok(None);
    }
    if !missing.is_empty() {
        return Err(ConfigError::IncompleteCredentials {
            group: group.to_owned(),
            missing: missing.join(", "),
        });
    }

    Ok(Some(vars.clone().map(|(_, value)| value.unwrap_or_default())))
}

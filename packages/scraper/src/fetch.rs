//! Listing page fetcher.
//!
//! One GET per page URL with a fixed locale and browser user agent. The raw
//! markup is decoded into a traversable [`Html`] document by
//! [`parse_document`].

use std::time::Duration;

use reqwest::header::{ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use scraper::Html;

use crate::ScrapeError;
use crate::retry;

/// `Accept-Language` sent with every page request.
pub const ACCEPT_LANGUAGE_VALUE: &str = "nl-NL,nl;q=0.9";

/// `User-Agent` sent with every page request.
pub const USER_AGENT_VALUE: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Fetches the raw markup of a listing page.
///
/// Implementations must treat a non-success HTTP status as an error rather
/// than returning the error page's body.
pub trait PageFetcher: Send + Sync {
    /// Fetches `url` and returns the response body.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError`] on network failure or a non-success status.
    fn fetch_markup(
        &self,
        url: &str,
    ) -> impl std::future::Future<Output = Result<String, ScrapeError>> + Send;
}

/// [`PageFetcher`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpPageFetcher {
    client: reqwest::Client,
    max_retries: u32,
}

impl HttpPageFetcher {
    /// Builds a fetcher whose requests time out after `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`ScrapeError::Http`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration) -> Result<Self, ScrapeError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE),
        );
        headers.insert(USER_AGENT, HeaderValue::from_static(USER_AGENT_VALUE));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            max_retries: retry::MAX_RETRIES,
        })
    }

    /// Overrides how many times a transient failure is retried.
    #[must_use]
    pub const fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl PageFetcher for HttpPageFetcher {
    async fn fetch_markup(&self, url: &str) -> Result<String, ScrapeError> {
        log::debug!("GET {url}");
        retry::send_text(|| self.client.get(url), self.max_retries).await
    }
}

/// Decodes fetched markup into a traversable document.
#[must_use]
pub fn parse_document(markup: &str) -> Html {
    Html::parse_document(markup)
}

//! Pagination controller.
//!
//! Walks a site's result pages one at a time, starting at page 1. Each page
//! is fetched, parsed, extracted and cut at the dedup boundary. The crawl is
//! done when a page yields no listings or reaches a known listing. A hard
//! page ceiling stops runaway pagination regardless.

use std::collections::HashSet;
use std::time::Duration;

use apartment_watch_scraper::extract::{ExtractedListing, Extractor};
use apartment_watch_scraper::fetch::{PageFetcher, parse_document};
use apartment_watch_source::progress::ProgressCallback;
use apartment_watch_source::site_def::SiteAdapter;

use crate::IngestError;
use crate::dedup::{KnownSet, PageResult, dedup_boundary};

/// Default hard ceiling on pages fetched per source.
pub const DEFAULT_MAX_PAGES: u32 = 50;

/// Default pause between two page fetches of the same source.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// Tunables for one crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlOptions {
    /// Pages fetched at most before the crawl is cut off.
    pub max_pages: u32,
    /// Pause before every page after the first.
    pub page_delay: Duration,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            page_delay: DEFAULT_PAGE_DELAY,
        }
    }
}

/// Why a crawl stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// A page produced no listings at all.
    EmptyPage,
    /// A page contained an already-known listing.
    ReachedKnown,
    /// The page ceiling was hit before either of the above.
    PageLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CrawlState {
    Fetching { page: u32 },
    Done(StopReason),
}

/// Result of crawling one source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlOutcome {
    /// New listings, in fetch order.
    pub listings: Vec<ExtractedListing>,
    /// Number of pages fetched.
    pub pages_fetched: u32,
    /// What ended the crawl.
    pub stop: StopReason,
}

/// One page after extraction and dedup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageScan {
    /// Listings the extractor produced before the dedup boundary was applied.
    pub extracted: usize,
    /// What survived the dedup boundary.
    pub result: PageResult,
}

impl PageScan {
    /// Returns the stop signal for this page, if any.
    #[must_use]
    pub const fn stop_reason(&self) -> Option<StopReason> {
        if self.extracted == 0 {
            Some(StopReason::EmptyPage)
        } else if self.result.reached_known {
            Some(StopReason::ReachedKnown)
        } else {
            None
        }
    }
}

/// Parses `markup`, extracts its listings and applies the dedup boundary.
#[must_use]
pub fn scan_page(markup: &str, extractor: &Extractor, known: &KnownSet) -> PageScan {
    let document = parse_document(markup);
    let listings = extractor.extract_all(&document);
    let extracted = listings.len();

    PageScan {
        extracted,
        result: dedup_boundary(listings, known),
    }
}

/// Crawls `site` until no new listings turn up.
///
/// # Errors
///
/// Returns [`IngestError::Fetch`] if any page cannot be fetched. Listings
/// gathered before the failure are discarded.
pub async fn crawl_site<F: PageFetcher>(
    fetcher: &F,
    site: &SiteAdapter,
    known: &KnownSet,
    options: &CrawlOptions,
    progress: &dyn ProgressCallback,
) -> Result<CrawlOutcome, IngestError> {
    let id = site.id();
    let mut listings: Vec<ExtractedListing> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut pages_fetched = 0;
    let mut state = CrawlState::Fetching { page: 1 };

    let stop = loop {
        let page = match state {
            CrawlState::Fetching { page } => page,
            CrawlState::Done(stop) => break stop,
        };

        if page > options.max_pages {
            log::warn!(
                "[{id}] Page limit of {} reached, stopping crawl",
                options.max_pages
            );
            state = CrawlState::Done(StopReason::PageLimit);
            continue;
        }

        if page > 1 && !options.page_delay.is_zero() {
            tokio::time::sleep(options.page_delay).await;
        }

        let url = site.page_url(page);
        progress.set_message(format!("{}: page {page}", site.name()));

        let markup = fetcher
            .fetch_markup(&url)
            .await
            .map_err(|error| IngestError::Fetch {
                site: id,
                page,
                error,
            })?;
        pages_fetched += 1;
        progress.inc(1);

        let scan = scan_page(&markup, site.extractor(), known);
        let stop = scan.stop_reason();

        let before = listings.len();
        for listing in scan.result.listings {
            if seen.insert(listing.record.street_name.clone()) {
                listings.push(listing);
            } else {
                log::debug!(
                    "[{id}] Skipping repeated listing '{}' on page {page}",
                    listing.record.street_name
                );
            }
        }

        log::info!(
            "[{id}] Page {page}: {} extracted, {} new",
            scan.extracted,
            listings.len() - before
        );

        state = stop.map_or(CrawlState::Fetching { page: page + 1 }, CrawlState::Done);
    };

    log::debug!("[{id}] Crawl stopped after {pages_fetched} page(s): {stop:?}");

    Ok(CrawlOutcome {
        listings,
        pages_fetched,
        stop,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use apartment_watch_scraper::ScrapeError;
    use apartment_watch_source::progress::NullProgress;
    use apartment_watch_source::site_def::{SiteOverrides, select_site};

    use super::*;
    use crate::dedup::tests::record;

    pub const SEARCH_URL: &str = "https://www.pararius.com/apartments/amsterdam";

    /// Serves canned markup per URL and records every request.
    #[derive(Default)]
    pub struct MemoryFetcher {
        pages: HashMap<String, String>,
        pub requests: Mutex<Vec<String>>,
    }

    impl MemoryFetcher {
        pub fn with_page(mut self, page: u32, streets: &[&str]) -> Self {
            self.pages
                .insert(format!("{SEARCH_URL}/page-{page}"), card_page(streets));
            self
        }

        pub fn requested(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    impl PageFetcher for MemoryFetcher {
        async fn fetch_markup(&self, url: &str) -> Result<String, ScrapeError> {
            self.requests.lock().unwrap().push(url.to_string());
            self.pages.get(url).cloned().ok_or_else(|| ScrapeError::Status {
                url: url.to_string(),
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
            })
        }
    }

    pub fn card_page(streets: &[&str]) -> String {
        let cards: String = streets
            .iter()
            .map(|street| {
                format!(
                    r#"<section class="listing-search-item">
                         <h2 class="listing-search-item__title">
                           <a href="/apartment-for-rent/amsterdam/{}">Flat {street}</a>
                         </h2>
                         <div class="listing-search-item__sub-title">1015 DK Amsterdam</div>
                         <div class="listing-search-item__price">€2,000 per month</div>
                       </section>"#,
                    street.replace(' ', "-").to_lowercase()
                )
            })
            .collect();
        format!("<html><body>{cards}</body></html>")
    }

    pub fn pararius() -> SiteAdapter {
        select_site("pararius", &SiteOverrides::default()).unwrap()
    }

    pub fn options(max_pages: u32) -> CrawlOptions {
        CrawlOptions {
            max_pages,
            page_delay: Duration::ZERO,
        }
    }

    fn streets(outcome: &CrawlOutcome) -> Vec<&str> {
        outcome
            .listings
            .iter()
            .map(|l| l.record.street_name.as_str())
            .collect()
    }

    #[test]
    fn scan_page_reports_empty_page() {
        let site = pararius();
        let scan = scan_page(&card_page(&[]), site.extractor(), &KnownSet::default());

        assert_eq!(scan.extracted, 0);
        assert_eq!(scan.stop_reason(), Some(StopReason::EmptyPage));
    }

    #[test]
    fn scan_page_continues_without_known_listings() {
        let site = pararius();
        let scan = scan_page(
            &card_page(&["Prinsengracht 5", "Vondelstraat 2"]),
            site.extractor(),
            &KnownSet::default(),
        );

        assert_eq!(scan.extracted, 2);
        assert_eq!(scan.result.listings.len(), 2);
        assert_eq!(scan.stop_reason(), None);
    }

    #[tokio::test]
    async fn stops_after_empty_third_page() {
        let fetcher = MemoryFetcher::default()
            .with_page(1, &["A 1", "B 2"])
            .with_page(2, &["C 3"])
            .with_page(3, &[]);

        let outcome = crawl_site(&fetcher, &pararius(), &KnownSet::default(), &options(50), &NullProgress)
            .await
            .unwrap();

        assert_eq!(streets(&outcome), ["A 1", "B 2", "C 3"]);
        assert_eq!(outcome.pages_fetched, 3);
        assert_eq!(outcome.stop, StopReason::EmptyPage);
        assert_eq!(fetcher.requested().len(), 3);
    }

    #[tokio::test]
    async fn stops_at_known_listing_on_first_page() {
        let fetcher = MemoryFetcher::default()
            .with_page(1, &["Prinsengracht 5", "Keizersgracht 10", "Vondelstraat 2"])
            .with_page(2, &["Herengracht 7"]);
        let known = KnownSet::from_records(vec![record("Keizersgracht 10")]);

        let outcome = crawl_site(&fetcher, &pararius(), &known, &options(50), &NullProgress)
            .await
            .unwrap();

        assert_eq!(streets(&outcome), ["Prinsengracht 5"]);
        assert_eq!(outcome.stop, StopReason::ReachedKnown);
        assert_eq!(fetcher.requested(), [format!("{SEARCH_URL}/page-1")]);
    }

    #[tokio::test]
    async fn fetch_failure_is_fatal_to_the_crawl() {
        let fetcher = MemoryFetcher::default().with_page(1, &["A 1"]);

        let err = crawl_site(&fetcher, &pararius(), &KnownSet::default(), &options(50), &NullProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Fetch { page: 2, .. }));
    }

    #[tokio::test]
    async fn page_limit_cuts_off_endless_results() {
        let fetcher = MemoryFetcher::default()
            .with_page(1, &["A 1"])
            .with_page(2, &["B 2"])
            .with_page(3, &["C 3"]);

        let outcome = crawl_site(&fetcher, &pararius(), &KnownSet::default(), &options(2), &NullProgress)
            .await
            .unwrap();

        assert_eq!(streets(&outcome), ["A 1", "B 2"]);
        assert_eq!(outcome.stop, StopReason::PageLimit);
        assert_eq!(fetcher.requested().len(), 2);
    }

    #[tokio::test]
    async fn listing_repeated_across_pages_is_kept_once() {
        let fetcher = MemoryFetcher::default()
            .with_page(1, &["A 1", "B 2"])
            .with_page(2, &["B 2", "C 3"])
            .with_page(3, &[]);

        let outcome = crawl_site(&fetcher, &pararius(), &KnownSet::default(), &options(50), &NullProgress)
            .await
            .unwrap();

        assert_eq!(streets(&outcome), ["A 1", "B 2", "C 3"]);
    }
}

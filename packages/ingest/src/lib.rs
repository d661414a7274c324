#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Incremental crawl of apartment listing sites.
//!
//! For each selected site: load the known records, crawl result pages until
//! a known listing or an empty page turns up, resolve travel times for the
//! new listings, prepend them to the known records and save. New listings
//! are announced through the configured [`Notifier`] once the save
//! succeeded.

pub mod config;
pub mod crawl;
pub mod dedup;
pub mod merge;

use std::sync::Arc;
use std::time::{Duration, Instant};

use apartment_watch_scraper::ScrapeError;
use apartment_watch_scraper::fetch::PageFetcher;
use apartment_watch_source::notify::Notifier;
use apartment_watch_source::progress::ProgressCallback;
use apartment_watch_source::site_def::SiteAdapter;
use apartment_watch_source::store::{KnownStore, StoreError};
use apartment_watch_source::travel::TravelTimeResolver;
use apartment_watch_source_models::{ApartmentRecord, SourceId};

use crate::crawl::{CrawlOptions, StopReason, crawl_site};
use crate::dedup::KnownSet;

/// Errors from an ingest run.
#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    /// A result page could not be fetched. Fatal to that site's crawl only.
    #[error("[{site}] failed to fetch page {page}: {error}")]
    Fetch {
        /// Site being crawled.
        site: SourceId,
        /// Page number that failed.
        page: u32,
        /// Underlying fetch error.
        #[source]
        error: ScrapeError,
    },

    /// A site's crawl ran past its deadline. Fatal to that site's crawl only.
    #[error("[{site}] crawl exceeded its {deadline:?} deadline")]
    Deadline {
        /// Site being crawled.
        site: SourceId,
        /// The deadline that was exceeded.
        deadline: Duration,
    },

    /// Loading or saving known records failed. Fatal to the whole run.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl IngestError {
    /// Returns `true` if the error only concerns one site and the run may
    /// continue with the next one.
    #[must_use]
    pub const fn is_site_local(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Deadline { .. })
    }
}

/// Per-run settings shared by every site.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Pagination tunables.
    pub crawl: CrawlOptions,
    /// Overall deadline for one site's crawl.
    pub source_deadline: Duration,
    /// Destination of the travel-time lookups.
    pub destination: String,
    /// Report new listings without notifying or saving.
    pub dry_run: bool,
}

/// The collaborators a run talks to.
pub struct Pipeline<'a, F: PageFetcher> {
    /// Fetches result pages.
    pub fetcher: &'a F,
    /// Holds known records per source.
    pub store: &'a dyn KnownStore,
    /// Resolves travel times for new listings.
    pub travel: &'a dyn TravelTimeResolver,
    /// Announces new listings.
    pub notifier: &'a dyn Notifier,
}

/// What a site's sync produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteReport {
    /// The site.
    pub site: SourceId,
    /// New records, in fetch order.
    pub new_records: Vec<ApartmentRecord>,
    /// Number of records known before this run.
    pub known_count: usize,
    /// Pages fetched.
    pub pages_fetched: u32,
    /// What ended the crawl.
    pub stop: StopReason,
    /// Whether the merged records were written to the store.
    pub saved: bool,
}

/// Outcome of a run over several sites.
#[derive(Debug, Default)]
pub struct RunSummary {
    /// Sites that synced.
    pub reports: Vec<SiteReport>,
    /// Sites whose crawl failed, with the reason.
    pub failures: Vec<(SourceId, IngestError)>,
}

impl RunSummary {
    /// Returns `true` if every site synced.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total new records across all sites.
    #[must_use]
    pub fn new_record_count(&self) -> usize {
        self.reports.iter().map(|r| r.new_records.len()).sum()
    }
}

/// Builds the notification text for one new record.
#[must_use]
pub fn notification_text(site_name: &str, record: &ApartmentRecord) -> String {
    format!("{site_name}: {}", record.detail_link)
}

/// Crawls one site and records what is new.
///
/// The store is written only after the crawl fully succeeded and only when
/// something new was found. Notifications go out after the save.
///
/// # Errors
///
/// Returns [`IngestError::Fetch`] or [`IngestError::Deadline`] if the crawl
/// fails, or [`IngestError::Store`] if the known records cannot be loaded
/// or saved.
pub async fn sync_site<F: PageFetcher>(
    pipeline: &Pipeline<'_, F>,
    site: &SiteAdapter,
    options: &RunOptions,
    progress: &dyn ProgressCallback,
) -> Result<SiteReport, IngestError> {
    let start = Instant::now();
    let id = site.id();
    log::info!("[{id}] Syncing {}", site.name());

    let known = KnownSet::from_records(pipeline.store.load(id).await?);
    let known_count = known.len();

    let outcome = tokio::time::timeout(
        options.source_deadline,
        crawl_site(pipeline.fetcher, site, &known, &options.crawl, progress),
    )
    .await
    .map_err(|_| IngestError::Deadline {
        site: id,
        deadline: options.source_deadline,
    })??;

    let mut new_records = Vec::with_capacity(outcome.listings.len());
    for listing in outcome.listings {
        let mut record = listing.record;
        record.travel_minutes = pipeline
            .travel
            .duration(&listing.address, &options.destination)
            .await;
        new_records.push(record);
    }

    let saved = if new_records.is_empty() {
        log::info!("[{id}] No new listings");
        false
    } else if options.dry_run {
        log::info!("[{id}] Dry run: {} new listing(s) not saved", new_records.len());
        false
    } else {
        let merged = merge::merge(new_records.clone(), known.into_records());
        pipeline.store.save(id, &merged).await?;

        for record in &new_records {
            pipeline
                .notifier
                .notify(&notification_text(site.name(), record))
                .await;
        }
        true
    };

    log::info!(
        "[{id}] Sync complete: {} new, {known_count} known, {} page(s) in {:.1}s",
        new_records.len(),
        outcome.pages_fetched,
        start.elapsed().as_secs_f64()
    );

    Ok(SiteReport {
        site: id,
        new_records,
        known_count,
        pages_fetched: outcome.pages_fetched,
        stop: outcome.stop,
        saved,
    })
}

/// Syncs each site in turn, one after another.
///
/// A site whose crawl fails is recorded in [`RunSummary::failures`] and the
/// run moves on to the next site.
///
/// # Errors
///
/// Returns [`IngestError::Store`] on the first store failure, which aborts
/// the remaining sites.
pub async fn run_sites<F: PageFetcher>(
    pipeline: &Pipeline<'_, F>,
    sites: &[SiteAdapter],
    options: &RunOptions,
    progress: impl Fn(&SiteAdapter) -> Arc<dyn ProgressCallback>,
) -> Result<RunSummary, IngestError> {
    let mut summary = RunSummary::default();

    for site in sites {
        let bar = progress(site);
        match sync_site(pipeline, site, options, bar.as_ref()).await {
            Ok(report) => {
                bar.finish(format!(
                    "{}: {} new listing(s)",
                    site.name(),
                    report.new_records.len()
                ));
                summary.reports.push(report);
            }
            Err(e) if e.is_site_local() => {
                bar.finish_and_clear();
                log::error!("{e}");
                summary.failures.push((site.id(), e));
            }
            Err(e) => {
                bar.finish_and_clear();
                return Err(e);
            }
        }
    }

    Ok(summary)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    use apartment_watch_source::progress::{NullProgress, null_progress};
    use apartment_watch_source::travel::NoTravelTime;
    use async_trait::async_trait;

    use super::*;
    use crate::crawl::tests::{MemoryFetcher, options, pararius};
    use crate::dedup::tests::record;

    #[derive(Default)]
    struct MemoryStore {
        records: Mutex<HashMap<SourceId, Vec<ApartmentRecord>>>,
        saves: Mutex<u32>,
        fail_save: bool,
    }

    impl MemoryStore {
        fn with(source: SourceId, records: Vec<ApartmentRecord>) -> Self {
            let store = Self::default();
            store.records.lock().unwrap().insert(source, records);
            store
        }

        fn streets(&self, source: SourceId) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .get(&source)
                .map(|records| records.iter().map(|r| r.street_name.clone()).collect())
                .unwrap_or_default()
        }

        fn saves(&self) -> u32 {
            *self.saves.lock().unwrap()
        }
    }

    #[async_trait]
    impl KnownStore for MemoryStore {
        async fn load(&self, source: SourceId) -> Result<Vec<ApartmentRecord>, StoreError> {
            Ok(self
                .records
                .lock()
                .unwrap()
                .get(&source)
                .cloned()
                .unwrap_or_default())
        }

        async fn save(&self, source: SourceId, records: &[ApartmentRecord]) -> Result<(), StoreError> {
            if self.fail_save {
                return Err(StoreError::Format {
                    message: "disk full".to_string(),
                });
            }
            *self.saves.lock().unwrap() += 1;
            self.records.lock().unwrap().insert(source, records.to_vec());
            Ok(())
        }
    }

    #[derive(Default)]
    struct RecordingNotifier {
        messages: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, text: &str) {
            self.messages.lock().unwrap().push(text.to_string());
        }
    }

    struct FixedTravelTime(u32);

    #[async_trait]
    impl TravelTimeResolver for FixedTravelTime {
        async fn duration(&self, _origin: &str, _destination: &str) -> Option<u32> {
            Some(self.0)
        }
    }

    fn run_options() -> RunOptions {
        RunOptions {
            crawl: options(50),
            source_deadline: Duration::from_secs(5),
            destination: "Centraal".to_string(),
            dry_run: false,
        }
    }

    #[tokio::test]
    async fn new_listings_are_prepended_saved_and_announced() {
        let fetcher = MemoryFetcher::default()
            .with_page(1, &["Prinsengracht 5", "Keizersgracht 10", "Vondelstraat 2"]);
        let store = MemoryStore::with(
            SourceId::Pararius,
            vec![record("Keizersgracht 10"), record("Herengracht 1")],
        );
        let notifier = RecordingNotifier::default();
        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            travel: &FixedTravelTime(24),
            notifier: &notifier,
        };

        let report = sync_site(&pipeline, &pararius(), &run_options(), &NullProgress)
            .await
            .unwrap();

        assert_eq!(report.new_records.len(), 1);
        assert_eq!(report.new_records[0].travel_minutes, Some(24));
        assert_eq!(report.stop, StopReason::ReachedKnown);
        assert_eq!(report.pages_fetched, 1);
        assert!(report.saved);
        assert_eq!(
            store.streets(SourceId::Pararius),
            ["Prinsengracht 5", "Keizersgracht 10", "Herengracht 1"]
        );
        assert_eq!(
            *notifier.messages.lock().unwrap(),
            ["Pararius: https://www.pararius.com/apartment-for-rent/amsterdam/prinsengracht-5"]
        );
    }

    #[tokio::test]
    async fn rerun_without_new_listings_leaves_store_untouched() {
        let fetcher = MemoryFetcher::default().with_page(1, &["Keizersgracht 10"]);
        let store = MemoryStore::with(SourceId::Pararius, vec![record("Keizersgracht 10")]);
        let notifier = RecordingNotifier::default();
        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            travel: &NoTravelTime,
            notifier: &notifier,
        };

        let report = sync_site(&pipeline, &pararius(), &run_options(), &NullProgress)
            .await
            .unwrap();

        assert!(report.new_records.is_empty());
        assert!(!report.saved);
        assert_eq!(store.saves(), 0);
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dry_run_neither_saves_nor_notifies() {
        let fetcher = MemoryFetcher::default().with_page(1, &["Prinsengracht 5"]).with_page(2, &[]);
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();
        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            travel: &NoTravelTime,
            notifier: &notifier,
        };
        let options = RunOptions {
            dry_run: true,
            ..run_options()
        };

        let report = sync_site(&pipeline, &pararius(), &options, &NullProgress)
            .await
            .unwrap();

        assert_eq!(report.new_records.len(), 1);
        assert!(!report.saved);
        assert_eq!(store.saves(), 0);
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn fetch_failure_keeps_previous_state_and_run_continues() {
        let fetcher = MemoryFetcher::default().with_page(1, &["Prinsengracht 5"]);
        let store = MemoryStore::with(SourceId::Pararius, vec![record("Herengracht 1")]);
        let notifier = RecordingNotifier::default();
        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            travel: &NoTravelTime,
            notifier: &notifier,
        };
        let sites = [pararius(), pararius()];

        let summary = run_sites(&pipeline, &sites, &run_options(), |_| null_progress())
            .await
            .unwrap();

        assert!(!summary.is_success());
        assert_eq!(summary.failures.len(), 2);
        assert!(matches!(summary.failures[0].1, IngestError::Fetch { page: 2, .. }));
        assert_eq!(store.saves(), 0);
        assert_eq!(store.streets(SourceId::Pararius), ["Herengracht 1"]);
    }

    #[tokio::test]
    async fn store_failure_aborts_the_run() {
        let fetcher = MemoryFetcher::default().with_page(1, &["Prinsengracht 5"]).with_page(2, &[]);
        let store = MemoryStore {
            fail_save: true,
            ..MemoryStore::default()
        };
        let notifier = RecordingNotifier::default();
        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            travel: &NoTravelTime,
            notifier: &notifier,
        };

        let err = run_sites(&pipeline, &[pararius()], &run_options(), |_| null_progress())
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Store(_)));
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    /// Stalls on its first request, then serves pages from `inner`.
    struct StallFirst {
        stalled: AtomicBool,
        inner: MemoryFetcher,
    }

    impl StallFirst {
        fn new(inner: MemoryFetcher) -> Self {
            Self {
                stalled: AtomicBool::new(false),
                inner,
            }
        }
    }

    impl PageFetcher for StallFirst {
        async fn fetch_markup(&self, url: &str) -> Result<String, ScrapeError> {
            if !self.stalled.swap(true, Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
            self.inner.fetch_markup(url).await
        }
    }

    fn short_deadline() -> RunOptions {
        RunOptions {
            source_deadline: Duration::from_millis(50),
            ..run_options()
        }
    }

    #[tokio::test]
    async fn crawl_past_deadline_is_site_local_and_saves_nothing() {
        let fetcher = StallFirst::new(MemoryFetcher::default().with_page(1, &["Prinsengracht 5"]));
        let store = MemoryStore::with(SourceId::Pararius, vec![record("Herengracht 1")]);
        let notifier = RecordingNotifier::default();
        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            travel: &NoTravelTime,
            notifier: &notifier,
        };

        let err = sync_site(&pipeline, &pararius(), &short_deadline(), &NullProgress)
            .await
            .unwrap_err();

        assert!(matches!(err, IngestError::Deadline { site: SourceId::Pararius, .. }));
        assert!(err.is_site_local());
        assert!(err.to_string().contains("50ms"), "{err}");
        assert_eq!(store.saves(), 0);
        assert_eq!(store.streets(SourceId::Pararius), ["Herengracht 1"]);
        assert!(notifier.messages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn run_continues_with_next_site_after_deadline() {
        let fetcher = StallFirst::new(
            MemoryFetcher::default()
                .with_page(1, &["Prinsengracht 5"])
                .with_page(2, &[]),
        );
        let store = MemoryStore::default();
        let notifier = RecordingNotifier::default();
        let pipeline = Pipeline {
            fetcher: &fetcher,
            store: &store,
            travel: &NoTravelTime,
            notifier: &notifier,
        };
        let sites = [pararius(), pararius()];

        let summary = run_sites(&pipeline, &sites, &short_deadline(), |_| null_progress())
            .await
            .unwrap();

        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(summary.failures[0].1, IngestError::Deadline { .. }));
        assert_eq!(summary.reports.len(), 1);
        assert_eq!(summary.new_record_count(), 1);
        assert_eq!(store.saves(), 1);
        assert_eq!(store.streets(SourceId::Pararius), ["Prinsengracht 5"]);
    }

    #[test]
    fn notification_names_site_and_link() {
        assert_eq!(
            notification_text("Funda", &record("Prinsengracht 5")),
            "Funda: https://example.test/Prinsengracht-5"
        );
    }
}

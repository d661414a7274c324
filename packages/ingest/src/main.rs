#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the apartment listing watcher.

use std::str::FromStr as _;

use apartment_watch_cli_utils::{IndicatifProgress, init_logger};
use apartment_watch_ingest::config::{IngestConfig, data_dir_from_env, parse_list};
use apartment_watch_ingest::{Pipeline, RunOptions, run_sites};
use apartment_watch_notify::TwilioNotifier;
use apartment_watch_scraper::fetch::HttpPageFetcher;
use apartment_watch_source::ConfigError;
use apartment_watch_source::notify::{LogNotifier, Notifier};
use apartment_watch_source::registry::all_sites;
use apartment_watch_source::store::KnownStore as _;
use apartment_watch_source::travel::{NoTravelTime, TravelTimeResolver};
use apartment_watch_source_models::{ApartmentRecord, SourceId};
use apartment_watch_store::CsvKnownStore;
use apartment_watch_travel::{DEFAULT_ENDPOINT, DirectionsResolver};
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "apartment_watch", about = "Apartment listing watcher")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Crawl the configured sites and record new listings
    Run {
        /// Comma-separated list of source IDs to crawl (overrides `APARTMENT_WATCH_SOURCES`)
        #[arg(long)]
        sources: Option<String>,
        /// Maximum number of result pages per source (overrides `APARTMENT_WATCH_MAX_PAGES`)
        #[arg(long)]
        max_pages: Option<u32>,
        /// Print new listings without notifying or saving them
        #[arg(long)]
        dry_run: bool,
    },
    /// List all configured listing sites
    Sources,
    /// Print the stored listings of one source
    Show {
        /// Source identifier (e.g., "funda")
        source: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::Sources => {
            println!("{:<12} {:<12} {:<16} SEARCH URL", "ID", "NAME", "EXTRACTOR");
            println!("{}", "-".repeat(80));
            for site in &all_sites() {
                println!(
                    "{:<12} {:<12} {:<16} {}",
                    site.id.as_ref(),
                    site.name,
                    format!("{:?}", site.extractor),
                    site.search_url
                );
            }
        }
        Commands::Show { source } => {
            let id = SourceId::from_str(source.trim())
                .map_err(|_| ConfigError::UnknownSource { id: source.clone() })?;
            let store = CsvKnownStore::new(data_dir_from_env());
            let records = store.load(id).await?;

            println!("{} stored listing(s) for {id}", records.len());
            for record in &records {
                print_record(record);
            }
        }
        Commands::Run {
            sources,
            max_pages,
            dry_run,
        } => {
            let mut config = IngestConfig::from_env()?;
            if let Some(max_pages) = max_pages {
                if max_pages == 0 {
                    return Err("--max-pages must be at least 1".into());
                }
                config.crawl.max_pages = max_pages;
            }

            let filter = sources.as_deref().map(parse_list);
            let sites = config.select_sites(filter.as_deref())?;
            log::info!(
                "Crawling {} site(s): {}",
                sites.len(),
                sites
                    .iter()
                    .map(|s| s.id().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            );

            let client = reqwest::Client::builder()
                .timeout(config.request_timeout)
                .build()?;

            let travel: Box<dyn TravelTimeResolver> = match &config.directions {
                Some(directions) => Box::new(DirectionsResolver::new(
                    client.clone(),
                    directions.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT),
                    &directions.api_key,
                )),
                None => {
                    log::info!("GOOGLE_API_KEY not set, travel times will be unknown");
                    Box::new(NoTravelTime)
                }
            };

            let notifier: Box<dyn Notifier> = match &config.twilio {
                Some(twilio) => Box::new(TwilioNotifier::new(client, twilio.clone())),
                None => Box::new(LogNotifier),
            };

            let fetcher = HttpPageFetcher::new(config.request_timeout)?;
            let store = CsvKnownStore::new(config.data_dir.clone());
            let pipeline = Pipeline {
                fetcher: &fetcher,
                store: &store,
                travel: travel.as_ref(),
                notifier: notifier.as_ref(),
            };
            let options = RunOptions {
                crawl: config.crawl,
                source_deadline: config.source_deadline,
                destination: config.destination.clone(),
                dry_run,
            };

            let summary = run_sites(&pipeline, &sites, &options, |site| {
                IndicatifProgress::pages_spinner(&multi, site.name())
            })
            .await?;

            if dry_run {
                for report in &summary.reports {
                    println!("{}: {} new listing(s)", report.site, report.new_records.len());
                    for record in &report.new_records {
                        print_record(record);
                    }
                }
            }

            log::info!(
                "Run complete: {} new listing(s) across {} site(s)",
                summary.new_record_count(),
                summary.reports.len()
            );

            if !summary.is_success() {
                let failed = summary
                    .failures
                    .iter()
                    .map(|(site, _)| site.to_string())
                    .collect::<Vec<_>>()
                    .join(", ");
                return Err(format!("crawl failed for: {failed}").into());
            }
        }
    }

    Ok(())
}

fn print_record(record: &ApartmentRecord) {
    let minutes = record
        .travel_minutes
        .map_or_else(|| "?".to_string(), |m| m.to_string());
    println!(
        "  {:<32} {:>4} min  {:<20} {:<10} {:<10} {}",
        record.street_name, minutes, record.price, record.size, record.rooms, record.detail_link
    );
}

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CSV-file backed [`KnownStore`].
//!
//! Each source is stored in its own file, `<dir>/<source>.csv`, with a header
//! row of [`OUTPUT_COLUMNS`] followed by one row per record in stored order.
//! Saves write a sibling temp file and rename it over the old one, so a failed
//! save leaves the previous contents intact.

pub mod paths;

use std::fs::File;
use std::path::{Path, PathBuf};

use apartment_watch_source::store::{KnownStore, StoreError};
use apartment_watch_source_models::{ApartmentRecord, OUTPUT_COLUMNS, SourceId};
use async_trait::async_trait;

/// Known-records store backed by one CSV file per source.
#[derive(Debug, Clone)]
pub struct CsvKnownStore {
    dir: PathBuf,
}

impl CsvKnownStore {
    /// Creates a store rooted at `dir`. The directory is created on first
    /// save.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Returns the file path holding `source`'s records.
    #[must_use]
    pub fn path_for(&self, source: SourceId) -> PathBuf {
        self.dir.join(format!("{source}.csv"))
    }
}

#[async_trait]
impl KnownStore for CsvKnownStore {
    async fn load(&self, source: SourceId) -> Result<Vec<ApartmentRecord>, StoreError> {
        let path = self.path_for(source);
        if !path.exists() {
            log::info!("[{source}] no stored records at {}", path.display());
            return Ok(Vec::new());
        }

        let records = read_records(&path)?;
        log::info!(
            "[{source}] loaded {} known records from {}",
            records.len(),
            path.display()
        );
        Ok(records)
    }

    async fn save(&self, source: SourceId, records: &[ApartmentRecord]) -> Result<(), StoreError> {
        paths::ensure_dir(&self.dir)?;

        let path = self.path_for(source);
        let tmp_path = path.with_extension("csv.tmp");

        if let Err(e) = write_records(&tmp_path, records) {
            std::fs::remove_file(&tmp_path).ok();
            return Err(e);
        }
        std::fs::rename(&tmp_path, &path)?;

        log::info!(
            "[{source}] saved {} records to {}",
            records.len(),
            path.display()
        );
        Ok(())
    }
}

/// Reads every record from a CSV file, validating its header row.
fn read_records(path: &Path) -> Result<Vec<ApartmentRecord>, StoreError> {
    let mut reader = csv::Reader::from_reader(File::open(path)?);

    let headers = reader.headers().map_err(format_error)?.clone();
    if headers.is_empty() {
        return Ok(Vec::new());
    }
    if !headers.iter().eq(OUTPUT_COLUMNS) {
        return Err(StoreError::Format {
            message: format!(
                "{}: unexpected header row {:?}",
                path.display(),
                headers.iter().collect::<Vec<_>>()
            ),
        });
    }

    reader
        .deserialize()
        .map(|row| row.map_err(format_error))
        .collect()
}

/// Writes the header row and all records to `path`, replacing its contents.
fn write_records(path: &Path, records: &[ApartmentRecord]) -> Result<(), StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(File::create(path)?);

    writer.write_record(OUTPUT_COLUMNS).map_err(format_error)?;
    for record in records {
        writer.serialize(record).map_err(format_error)?;
    }
    writer.flush()?;
    Ok(())
}

fn format_error(e: csv::Error) -> StoreError {
    StoreError::Format {
        message: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> CsvKnownStore {
        CsvKnownStore::new(
            std::env::temp_dir().join(format!("apartment_watch_store_{}", uuid::Uuid::new_v4())),
        )
    }

    fn record(street: &str, minutes: Option<u32>, agent: Option<&str>) -> ApartmentRecord {
        ApartmentRecord {
            street_name: street.to_string(),
            travel_minutes: minutes,
            price: "€ 1.900 /maand".to_string(),
            size: "55 m²".to_string(),
            rooms: "2 kamers".to_string(),
            agent: agent.map(str::to_string),
            detail_link: format!("https://www.funda.nl/detail/{}", street.replace(' ', "-")),
            map_link: format!(
                "https://www.google.com/maps/search/?api=1&query={}",
                street.replace(' ', "+")
            ),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_as_empty() {
        let store = temp_store();
        assert!(store.load(SourceId::Funda).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn round_trip_preserves_order_and_unknowns() {
        let store = temp_store();
        let records = vec![
            record("Prinsengracht 5", Some(18), Some("Best Rentals")),
            record("Keizersgracht 10", None, None),
            record("Vondelstraat 2, Oud-West", Some(25), Some("Agent, \"Quoted\"")),
        ];

        store.save(SourceId::Funda, &records).await.unwrap();
        let loaded = store.load(SourceId::Funda).await.unwrap();

        assert_eq!(loaded, records);
    }

    #[tokio::test]
    async fn sources_are_stored_separately() {
        let store = temp_store();
        store
            .save(SourceId::Funda, &[record("Prinsengracht 5", None, None)])
            .await
            .unwrap();

        assert!(store.load(SourceId::Pararius).await.unwrap().is_empty());
        assert_eq!(store.load(SourceId::Funda).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_replaces_previous_contents() {
        let store = temp_store();
        store
            .save(
                SourceId::Pararius,
                &[
                    record("Prinsengracht 5", None, None),
                    record("Keizersgracht 10", None, None),
                ],
            )
            .await
            .unwrap();
        store
            .save(SourceId::Pararius, &[record("Vondelstraat 2", None, None)])
            .await
            .unwrap();

        let loaded = store.load(SourceId::Pararius).await.unwrap();
        assert_eq!(loaded, vec![record("Vondelstraat 2", None, None)]);
        assert!(!store.path_for(SourceId::Pararius).with_extension("csv.tmp").exists());
    }

    #[tokio::test]
    async fn empty_save_writes_header_row() {
        let store = temp_store();
        store.save(SourceId::Funda, &[]).await.unwrap();

        let contents = std::fs::read_to_string(store.path_for(SourceId::Funda)).unwrap();
        assert_eq!(contents.trim_end(), OUTPUT_COLUMNS.join(","));
        assert!(store.load(SourceId::Funda).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unexpected_header_is_a_format_error() {
        let store = temp_store();
        paths::ensure_dir(&store.dir).unwrap();
        std::fs::write(store.path_for(SourceId::Funda), "Address,Price\nA,1\n").unwrap();

        let err = store.load(SourceId::Funda).await.unwrap_err();
        assert!(matches!(err, StoreError::Format { .. }));
    }
}

//! Known-records store contract.

use apartment_watch_source_models::{ApartmentRecord, SourceId};
use async_trait::async_trait;

/// Errors from loading or saving known records.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// I/O error (file read/write).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored data could not be read or written in the expected format.
    #[error("Store format error: {message}")]
    Format {
        /// Description of what went wrong.
        message: String,
    },
}

/// Persistent, order-preserving storage of each source's known records.
///
/// Each source owns a separate logical table, so saves for different
/// sources never interfere.
#[async_trait]
pub trait KnownStore: Send + Sync {
    /// Loads the known records of `source`, in stored order.
    ///
    /// A source that has never been saved loads as an empty sequence.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be read.
    async fn load(&self, source: SourceId) -> Result<Vec<ApartmentRecord>, StoreError>;

    /// Replaces the known records of `source` with `records`, in order.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the backend cannot be written.
    async fn save(&self, source: SourceId, records: &[ApartmentRecord]) -> Result<(), StoreError>;
}

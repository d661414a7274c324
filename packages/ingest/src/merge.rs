//! Merge of newly discovered records with the known dataset.

use apartment_watch_source_models::ApartmentRecord;

/// Returns `new` followed by `known`, each in its original order.
///
/// No dedup happens here: the dedup boundary already guarantees that `new`
/// holds no street name present in `known`.
#[must_use]
pub fn merge(mut new: Vec<ApartmentRecord>, known: Vec<ApartmentRecord>) -> Vec<ApartmentRecord> {
    new.extend(known);
    new
}

use crate::collection::CollectionName;
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use crate::store::DocumentStore;
use serde::Serialize;

/// What one normalizer run changed in a collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeReport {
    pub collection: CollectionName,
    pub containers_removed: usize,
    pub items_inserted: usize,
}

impl NormalizeReport {
    /// True when the collection was already flat.
    pub fn is_noop(&self) -> bool {
        self.containers_removed == 0
    }
}

/// Result of normalizing several collections. Failures do not stop the run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizeSummary {
    pub reports: Vec<NormalizeReport>,
    pub failures: Vec<(CollectionName, String)>,
}

impl NormalizeSummary {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Turns every legacy container record of `name` into plain documents.
///
/// The containers are removed and their items inserted as one batch under
/// the collection's write lock. Unique indexes are checked for the items
/// first, so a conflict leaves the collection unchanged. Running it on a
/// flat collection is a no-op.
pub fn normalize_collection(store: &DocumentStore, name: CollectionName) -> StorefrontResult<NormalizeReport> {
    let (containers_removed, items_inserted) = store
        .collection(name)
        .flatten_containers()
        .map_err(|err| {
            log::error!("Error normalizing collection {}: {}", name, err);
            StorefrontError::new_with_cause(
                &format!("Failed to normalize collection {}", name),
                ErrorKind::MigrationError,
                err,
            )
        })?;

    if containers_removed == 0 {
        log::debug!("Collection {} has no nested arrays", name);
    } else {
        log::info!(
            "Normalized {}: {} container documents replaced by {} documents",
            name,
            containers_removed,
            items_inserted
        );
    }
    Ok(NormalizeReport {
        collection: name,
        containers_removed,
        items_inserted,
    })
}

/// Normalizes each collection in turn, collecting per-collection failures.
pub fn normalize_collections(store: &DocumentStore, names: &[CollectionName]) -> NormalizeSummary {
    let mut summary = NormalizeSummary::default();
    for name in names {
        match normalize_collection(store, *name) {
            Ok(report) => summary.reports.push(report),
            Err(err) => summary.failures.push((*name, err.to_string())),
        }
    }
    summary
}

use super::DataSource;
use crate::collection::{CollectionName, DeleteOptions, Document, FindOptions, UpdateOptions, UpdateSpec};
use crate::errors::{StorefrontError, StorefrontResult};
use crate::filter::Query;
use crate::fixture::FixtureSet;
use crate::store::StorageRecord;
use parking_lot::RwLock;
use std::sync::Arc;

/// Read-only [DataSource] serving a fixture file from memory.
///
/// The fixture is parsed on first read and cached until [DataSource::reset].
/// Queries are evaluated by equality only: a `$` operator object matches a
/// field holding that same object. Every write fails with
/// [ErrorKind::UnsupportedOperation](crate::errors::ErrorKind::UnsupportedOperation)
/// and leaves the cache untouched.
pub struct SnapshotSource {
    name: CollectionName,
    fixtures: FixtureSet,
    cache: RwLock<Option<Arc<Vec<StorageRecord>>>>,
}

impl SnapshotSource {
    pub fn new(name: CollectionName, fixtures: FixtureSet) -> Self {
        SnapshotSource {
            name,
            fixtures,
            cache: RwLock::new(None),
        }
    }

    pub fn is_cached(&self) -> bool {
        self.cache.read().is_some()
    }

    fn records(&self) -> StorefrontResult<Arc<Vec<StorageRecord>>> {
        if let Some(records) = self.cache.read().as_ref() {
            return Ok(records.clone());
        }

        let mut cache = self.cache.write();
        if let Some(records) = cache.as_ref() {
            return Ok(records.clone());
        }
        let fixture = self.fixtures.load(self.name).map_err(|err| {
            log::error!("Error loading static JSON for collection {}: {}", self.name, err);
            err
        })?;
        let records: Vec<StorageRecord> = fixture
            .documents
            .into_iter()
            .map(|doc| StorageRecord::classify(self.name, doc))
            .collect();
        log::debug!("Cached {} records of {} from fixtures", records.len(), self.name);
        let records = Arc::new(records);
        *cache = Some(records.clone());
        Ok(records)
    }

    /// Plain matches, then nested matches, in fixture order.
    fn matching(&self, query: &Query) -> StorefrontResult<Vec<Document>> {
        let records = self.records()?;
        let plain = records
            .iter()
            .filter_map(StorageRecord::as_plain)
            .filter(|doc| query.matches_equality(doc));
        let nested = records
            .iter()
            .flat_map(StorageRecord::items)
            .filter(|doc| query.matches_equality(doc));
        Ok(plain.chain(nested).cloned().collect())
    }

    fn rejected(&self, operation: &str) -> StorefrontError {
        log::warn!("Rejected {} on collection {}: static JSON mode is read-only", operation, self.name);
        StorefrontError::unsupported(operation)
    }
}

impl DataSource for SnapshotSource {
    fn collection(&self) -> CollectionName {
        self.name
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn find_one(&self, query: &Query) -> StorefrontResult<Option<Document>> {
        Ok(self.matching(query)?.into_iter().next())
    }

    fn find(&self, query: &Query, options: &FindOptions) -> StorefrontResult<Vec<Document>> {
        Ok(options.apply(self.matching(query)?))
    }

    fn count(&self, query: &Query) -> StorefrontResult<usize> {
        Ok(self.matching(query)?.len())
    }

    fn create(&self, _doc: Document) -> StorefrontResult<Document> {
        Err(self.rejected("create"))
    }

    fn update(&self, _query: &Query, _spec: &UpdateSpec, _options: UpdateOptions) -> StorefrontResult<usize> {
        Err(self.rejected("update"))
    }

    fn delete(&self, _query: &Query, _options: DeleteOptions) -> StorefrontResult<usize> {
        Err(self.rejected("delete"))
    }

    fn reset(&self) -> StorefrontResult<()> {
        *self.cache.write() = None;
        log::debug!("Dropped snapshot cache of {}", self.name);
        Ok(())
    }
}

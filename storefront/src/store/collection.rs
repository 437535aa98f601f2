use super::index::{index_specs, FieldIndex};
use super::persistence::{CollectionFile, LogEntry};
use super::record::StorageRecord;
use crate::collection::{CollectionName, DeleteOptions, Document, FindOptions, UpdateOptions, UpdateSpec};
use crate::common::util::now_iso;
use crate::common::{CREATED_AT, UPDATED_AT};
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use crate::filter::Query;
use crate::fixture::{FixtureSet, FixtureShape};
use itertools::Either;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

/// What an initialization found or did. Only the call that actually seeds
/// reports [InitOutcome::Seeded]; later calls report what the collection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// The collection already held records.
    LoadedNonEmpty,
    /// The collection is empty and there was no fixture data to seed from.
    LoadedEmpty,
    /// The file was empty and this many fixture documents were inserted.
    Seeded(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InitState {
    Uninitialized,
    Seeding,
    Ready,
}

/// A record selected by a query, in storage order.
#[derive(Debug, Clone, Copy)]
enum Target {
    Plain(u64),
    Nested(u64, usize),
}

struct CollectionState {
    file: CollectionFile,
    records: BTreeMap<u64, StorageRecord>,
    indexes: Vec<FieldIndex>,
    next_record_id: u64,
}

impl CollectionState {
    fn new(collection: CollectionName, db_path: &Path, corrupt_threshold: f64) -> Self {
        CollectionState {
            file: CollectionFile::new(db_path, collection, corrupt_threshold),
            records: BTreeMap::new(),
            indexes: index_specs(collection).into_iter().map(FieldIndex::new).collect(),
            next_record_id: 1,
        }
    }

    fn load(&mut self, collection: CollectionName) -> StorefrontResult<()> {
        let log = self.file.replay()?;
        if log.needs_compaction() {
            self.file
                .compact(log.records.iter().map(|(record_id, doc)| (*record_id, doc)))?;
            log::info!(
                "Compacted collection {} from {} lines to {} records",
                collection,
                log.lines,
                log.records.len()
            );
        }

        self.clear();
        self.next_record_id = log.next_record_id;
        for (record_id, doc) in log.records {
            let record = StorageRecord::classify(collection, doc);
            self.index_record(record_id, &record);
            self.records.insert(record_id, record);
        }
        Ok(())
    }

    fn clear(&mut self) {
        self.records.clear();
        for index in self.indexes.iter_mut() {
            index.clear();
        }
    }

    fn index_record(&mut self, record_id: u64, record: &StorageRecord) {
        if let StorageRecord::Plain(doc) = record {
            for index in self.indexes.iter_mut() {
                index.insert(record_id, doc);
            }
        }
    }

    fn unindex_record(&mut self, record_id: u64, record: &StorageRecord) {
        if let StorageRecord::Plain(doc) = record {
            for index in self.indexes.iter_mut() {
                index.remove(record_id, doc);
            }
        }
    }

    /// Record ids narrowed by indexed equality conditions, or `None` when
    /// no condition hits an index.
    fn candidates(&self, query: &Query) -> Option<BTreeSet<u64>> {
        let mut narrowed: Option<BTreeSet<u64>> = None;
        for (field, key) in query.indexable_equalities() {
            if let Some(index) = self.indexes.iter().find(|index| index.field() == field) {
                let ids = index.lookup(&key);
                narrowed = Some(match narrowed {
                    Some(current) => current.intersection(&ids).copied().collect(),
                    None => ids,
                });
            }
        }
        narrowed
    }

    fn plain_matches<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = (u64, &'a Document)> + 'a {
        let records = match self.candidates(query) {
            Some(ids) => Either::Left(
                ids.into_iter()
                    .filter_map(move |record_id| self.records.get(&record_id).map(|r| (record_id, r))),
            ),
            None => Either::Right(self.records.iter().map(|(record_id, r)| (*record_id, r))),
        };
        records
            .filter_map(|(record_id, record)| record.as_plain().map(|doc| (record_id, doc)))
            .filter(move |(_, doc)| query.matches(doc))
    }

    fn nested_matches<'a>(
        &'a self,
        query: &'a Query,
    ) -> impl Iterator<Item = (u64, usize, &'a Document)> + 'a {
        self.records
            .iter()
            .filter(|(_, record)| record.is_container())
            .flat_map(move |(record_id, record)| {
                record
                    .nested_matches(query)
                    .map(move |(position, doc)| (*record_id, position, doc))
            })
    }

    /// Plain matches first, then nested matches; only the first one unless `multi`.
    fn targets(&self, query: &Query, multi: bool) -> Vec<Target> {
        let plain = self
            .plain_matches(query)
            .map(|(record_id, _)| Target::Plain(record_id));
        let nested = self
            .nested_matches(query)
            .map(|(record_id, position, _)| Target::Nested(record_id, position));
        let all = plain.chain(nested);
        if multi {
            all.collect()
        } else {
            all.take(1).collect()
        }
    }

    fn plain(&self, record_id: u64) -> StorefrontResult<&Document> {
        self.records
            .get(&record_id)
            .and_then(StorageRecord::as_plain)
            .ok_or_else(|| missing_record(record_id))
    }

    fn container_items(&self, record_id: u64) -> StorefrontResult<Vec<Document>> {
        match self.records.get(&record_id) {
            Some(StorageRecord::Container { items, .. }) => Ok(items.clone()),
            _ => Err(missing_record(record_id)),
        }
    }

    /// Writes a batch of record changes (`None` deletes). Unique indexes are
    /// checked and the batch is appended to the file before memory changes,
    /// so a failed batch leaves the collection untouched.
    fn write_records(
        &mut self,
        collection: CollectionName,
        changes: Vec<(u64, Option<StorageRecord>)>,
    ) -> StorefrontResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let incoming: Vec<(u64, &Document)> = changes
            .iter()
            .filter_map(|(record_id, record)| match record {
                Some(StorageRecord::Plain(doc)) => Some((*record_id, doc)),
                _ => None,
            })
            .collect();
        for index in &self.indexes {
            index.check_unique(collection, &incoming)?;
        }

        let on_disk: Vec<(u64, Option<Document>)> = changes
            .iter()
            .map(|(record_id, record)| (*record_id, record.as_ref().map(StorageRecord::to_document)))
            .collect();
        let entries: Vec<LogEntry<'_>> = on_disk
            .iter()
            .map(|(record_id, doc)| match doc {
                Some(doc) => LogEntry::Put(*record_id, doc),
                None => LogEntry::Delete(*record_id),
            })
            .collect();
        self.file.append(&entries)?;

        for (record_id, record) in changes {
            if let Some(old) = self.records.remove(&record_id) {
                self.unindex_record(record_id, &old);
            }
            if let Some(record) = record {
                self.index_record(record_id, &record);
                self.records.insert(record_id, record);
            }
            self.next_record_id = self.next_record_id.max(record_id + 1);
        }
        Ok(())
    }

    fn insert_records(&mut self, collection: CollectionName, docs: Vec<Document>) -> StorefrontResult<usize> {
        let start = self.next_record_id;
        let count = docs.len();
        let changes = docs
            .into_iter()
            .enumerate()
            .map(|(offset, doc)| {
                (
                    start + offset as u64,
                    Some(StorageRecord::classify(collection, doc)),
                )
            })
            .collect();
        self.write_records(collection, changes)?;
        Ok(count)
    }
}

fn missing_record(record_id: u64) -> StorefrontError {
    StorefrontError::new(
        &format!("Record {} vanished while the collection was locked", record_id),
        ErrorKind::InternalError,
    )
}

/// Stamps `created_at`/`updated_at` with the same instant where absent.
fn stamp_new(doc: &mut Document, now: &str) -> StorefrontResult<()> {
    if !doc.contains_key(CREATED_AT) {
        doc.put(CREATED_AT, now)?;
    }
    if !doc.contains_key(UPDATED_AT) {
        doc.put(UPDATED_AT, now)?;
    }
    Ok(())
}

/// One collection of the file-backed document store.
///
/// Records are loaded from `<db_path>/<collection>.db` on first access and
/// seeded from the collection's fixture when the file is empty. Each
/// operation runs under the collection's lock, so it is atomic with respect
/// to other operations on the same collection; nothing spans operations.
///
/// Every read and write path handles both plain documents and legacy
/// container records (see [StorageRecord]).
pub struct DocumentCollection {
    name: CollectionName,
    fixtures: FixtureSet,
    init: Mutex<InitState>,
    state: RwLock<CollectionState>,
}

impl DocumentCollection {
    pub(crate) fn new(
        name: CollectionName,
        db_path: &Path,
        fixtures: FixtureSet,
        corrupt_threshold: f64,
    ) -> Self {
        DocumentCollection {
            name,
            fixtures,
            init: Mutex::new(InitState::Uninitialized),
            state: RwLock::new(CollectionState::new(name, db_path, corrupt_threshold)),
        }
    }

    pub fn name(&self) -> CollectionName {
        self.name
    }

    pub fn file_path(&self) -> PathBuf {
        self.state.read().file.path().to_path_buf()
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.init.lock(), InitState::Ready)
    }

    /// Loads the collection file and seeds it if empty, exactly once.
    ///
    /// Concurrent first accesses serialize on the initialization lock; the
    /// losers see a loaded collection. A failed initialization leaves the
    /// collection uninitialized so the next access retries.
    pub fn ensure_ready(&self) -> StorefrontResult<InitOutcome> {
        let mut init = self.init.lock();
        if *init == InitState::Ready {
            return Ok(self.loaded_outcome());
        }

        *init = InitState::Seeding;
        match self.initialize() {
            Ok(outcome) => {
                log::debug!("Collection {} ready: {:?}", self.name, outcome);
                *init = InitState::Ready;
                Ok(outcome)
            }
            Err(err) => {
                *init = InitState::Uninitialized;
                Err(err)
            }
        }
    }

    fn loaded_outcome(&self) -> InitOutcome {
        if self.state.read().records.is_empty() {
            InitOutcome::LoadedEmpty
        } else {
            InitOutcome::LoadedNonEmpty
        }
    }

    fn initialize(&self) -> StorefrontResult<InitOutcome> {
        let mut state = self.state.write();
        state.load(self.name)?;
        if !state.records.is_empty() {
            return Ok(InitOutcome::LoadedNonEmpty);
        }
        self.seed(&mut state)
    }

    fn seed(&self, state: &mut CollectionState) -> StorefrontResult<InitOutcome> {
        let fixture = self.fixtures.load(self.name)?;
        if fixture.is_empty() {
            if fixture.shape != FixtureShape::Missing {
                log::info!("Fixture for collection {} has no documents", self.name);
            }
            return Ok(InitOutcome::LoadedEmpty);
        }

        let shape = fixture.shape;
        let count = state.insert_records(self.name, fixture.documents)?;
        log::info!(
            "Seeded collection {} with {} documents ({:?} fixture)",
            self.name,
            count,
            shape
        );
        Ok(InitOutcome::Seeded(count))
    }

    pub fn find_one(&self, query: &Query) -> StorefrontResult<Option<Document>> {
        self.ensure_ready()?;
        let state = self.state.read();
        if let Some((_, doc)) = state.plain_matches(query).next() {
            return Ok(Some(doc.clone()));
        }
        let nested = state.nested_matches(query).next().map(|(_, _, doc)| doc.clone());
        Ok(nested)
    }

    /// Plain and nested matches combined, then sorted, paged and projected
    /// as one list.
    pub fn find(&self, query: &Query, options: &FindOptions) -> StorefrontResult<Vec<Document>> {
        self.ensure_ready()?;
        let state = self.state.read();
        let mut docs: Vec<Document> = state
            .plain_matches(query)
            .map(|(_, doc)| doc.clone())
            .collect();
        docs.extend(state.nested_matches(query).map(|(_, _, doc)| doc.clone()));
        drop(state);
        Ok(options.apply(docs))
    }

    pub fn count(&self, query: &Query) -> StorefrontResult<usize> {
        self.ensure_ready()?;
        let state = self.state.read();
        let total = state.plain_matches(query).count() + state.nested_matches(query).count();
        Ok(total)
    }

    /// Inserts a new document. It must carry a string `id`; `created_at`
    /// and `updated_at` are stamped with the same instant when absent.
    pub fn insert(&self, doc: Document) -> StorefrontResult<Document> {
        if !doc.has_id() {
            return Err(StorefrontError::new(
                &format!("Document for collection {} needs a string id", self.name),
                ErrorKind::ValidationError,
            ));
        }
        self.ensure_ready()?;

        let mut doc = doc;
        stamp_new(&mut doc, &now_iso())?;
        let mut state = self.state.write();
        state.insert_records(self.name, vec![doc.clone()])?;
        Ok(doc)
    }

    /// Stores documents exactly as given, classified by shape. No id is
    /// required and no timestamps are added.
    pub fn insert_raw(&self, docs: Vec<Document>) -> StorefrontResult<usize> {
        self.ensure_ready()?;
        let mut state = self.state.write();
        state.insert_records(self.name, docs)
    }

    /// Applies `spec` to the matching documents and returns how many
    /// matched. Without `multi` only the first plain match, else the first
    /// nested match, is changed. `updated_at` is refreshed unless the update
    /// sets it.
    pub fn update(&self, query: &Query, spec: &UpdateSpec, options: UpdateOptions) -> StorefrontResult<usize> {
        self.ensure_ready()?;
        let now = now_iso();
        let mut state = self.state.write();
        let targets = state.targets(query, options.is_multi());

        if targets.is_empty() {
            if !options.is_upsert() {
                return Ok(0);
            }
            let mut doc = spec.apply(&query.equality_document())?;
            stamp_new(&mut doc, &now)?;
            state.insert_records(self.name, vec![doc])?;
            log::debug!("Upserted a document into {}", self.name);
            return Ok(1);
        }

        let refresh = |doc: &Document| -> StorefrontResult<Document> {
            let mut updated = spec.apply(doc)?;
            if !spec.sets_field(UPDATED_AT) {
                updated.put(UPDATED_AT, now.as_str())?;
            }
            Ok(updated)
        };

        let mut changes = Vec::new();
        let mut containers: BTreeMap<u64, Vec<Document>> = BTreeMap::new();
        for target in &targets {
            match *target {
                Target::Plain(record_id) => {
                    let updated = refresh(state.plain(record_id)?)?;
                    changes.push((record_id, Some(StorageRecord::Plain(updated))));
                }
                Target::Nested(record_id, position) => {
                    if !containers.contains_key(&record_id) {
                        containers.insert(record_id, state.container_items(record_id)?);
                    }
                    if let Some(item) = containers
                        .get_mut(&record_id)
                        .and_then(|items| items.get_mut(position))
                    {
                        *item = refresh(item)?;
                    }
                }
            }
        }
        for (record_id, items) in containers {
            changes.push((
                record_id,
                Some(StorageRecord::Container {
                    collection: self.name,
                    items,
                }),
            ));
        }

        state.write_records(self.name, changes)?;
        Ok(targets.len())
    }

    /// Removes matching documents and returns how many were removed.
    pub fn delete(&self, query: &Query, options: DeleteOptions) -> StorefrontResult<usize> {
        self.ensure_ready()?;
        let mut state = self.state.write();
        let targets = state.targets(query, options.is_multi());

        let mut changes = Vec::new();
        let mut removed_positions: BTreeMap<u64, BTreeSet<usize>> = BTreeMap::new();
        for target in &targets {
            match *target {
                Target::Plain(record_id) => changes.push((record_id, None)),
                Target::Nested(record_id, position) => {
                    removed_positions.entry(record_id).or_default().insert(position);
                }
            }
        }
        for (record_id, positions) in removed_positions {
            let items: Vec<Document> = state
                .container_items(record_id)?
                .into_iter()
                .enumerate()
                .filter(|(position, _)| !positions.contains(position))
                .map(|(_, item)| item)
                .collect();
            // an emptied container goes away with its last item
            let record = (!items.is_empty()).then(|| StorageRecord::Container {
                collection: self.name,
                items,
            });
            changes.push((record_id, record));
        }

        state.write_records(self.name, changes)?;
        Ok(targets.len())
    }

    /// Discards every record and seeds again from the fixture.
    pub fn reset(&self) -> StorefrontResult<InitOutcome> {
        let mut init = self.init.lock();
        *init = InitState::Seeding;
        match self.reseed() {
            Ok(outcome) => {
                log::info!("Collection {} reset: {:?}", self.name, outcome);
                *init = InitState::Ready;
                Ok(outcome)
            }
            Err(err) => {
                *init = InitState::Uninitialized;
                Err(err)
            }
        }
    }

    fn reseed(&self) -> StorefrontResult<InitOutcome> {
        let mut state = self.state.write();
        state.file.compact(std::iter::empty::<(u64, &Document)>())?;
        state.clear();
        self.seed(&mut state)
    }

    /// Rewrites the collection file with one line per live record.
    pub fn compact(&self) -> StorefrontResult<()> {
        self.ensure_ready()?;
        let mut state = self.state.write();
        let docs: Vec<(u64, Document)> = state
            .records
            .iter()
            .map(|(record_id, record)| (*record_id, record.to_document()))
            .collect();
        state
            .file
            .compact(docs.iter().map(|(record_id, doc)| (*record_id, doc)))?;
        log::info!("Compacted collection {} to {} records", self.name, docs.len());
        Ok(())
    }

    /// Every stored record in storage order, containers included.
    pub fn records(&self) -> StorefrontResult<Vec<StorageRecord>> {
        self.ensure_ready()?;
        Ok(self.state.read().records.values().cloned().collect())
    }

    /// Replaces every container record with its items as plain documents.
    /// Returns `(containers_removed, items_inserted)`.
    pub(crate) fn flatten_containers(&self) -> StorefrontResult<(usize, usize)> {
        self.ensure_ready()?;
        let mut state = self.state.write();

        let mut next_record_id = state.next_record_id;
        let mut changes = Vec::new();
        let mut containers_removed = 0;
        let mut items_inserted = 0;
        for (record_id, record) in state.records.iter() {
            if let StorageRecord::Container { items, .. } = record {
                changes.push((*record_id, None));
                containers_removed += 1;
                for item in items {
                    changes.push((
                        next_record_id,
                        Some(StorageRecord::classify(self.name, item.clone())),
                    ));
                    next_record_id += 1;
                    items_inserted += 1;
                }
            }
        }

        state.write_records(self.name, changes)?;
        Ok((containers_removed, items_inserted))
    }
}

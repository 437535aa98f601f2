use crate::collection::CollectionName;
use crate::config::DataConfig;
use crate::errors::{StorefrontError, StorefrontResult};
use crate::fixture::FixtureSet;
use crate::migration::{normalize_collections, NormalizeSummary};
use crate::service::{EntityService, EntityServices};
use crate::source::{DataSource, DocumentStoreSource, SnapshotSource};
use crate::store::{CollectionFileStat, DocumentStore, InitOutcome};
use dashmap::DashMap;
use serde::Serialize;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Which backend serves data-source requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DataMode {
    /// File-backed document store, read-write.
    DocumentStore,
    /// Fixtures served from memory, read-only.
    Snapshot,
}

impl DataMode {
    pub fn is_writable(&self) -> bool {
        matches!(self, DataMode::DocumentStore)
    }

    pub fn access(&self) -> &'static str {
        match self {
            DataMode::DocumentStore => "read-write",
            DataMode::Snapshot => "read-only",
        }
    }

    fn from_flag(document_store: bool) -> Self {
        if document_store {
            DataMode::DocumentStore
        } else {
            DataMode::Snapshot
        }
    }
}

impl Display for DataMode {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataMode::DocumentStore => write!(f, "document store"),
            DataMode::Snapshot => write!(f, "static JSON"),
        }
    }
}

/// Per-collection results of initializing the document store.
#[derive(Debug, Clone, Default)]
pub struct InitReport {
    pub initialized: Vec<(CollectionName, InitOutcome)>,
    pub failures: Vec<(CollectionName, String)>,
}

impl InitReport {
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Total documents inserted from fixtures.
    pub fn seeded_documents(&self) -> usize {
        self.initialized
            .iter()
            .map(|(_, outcome)| match outcome {
                InitOutcome::Seeded(count) => *count,
                _ => 0,
            })
            .sum()
    }
}

#[derive(Debug, Clone)]
pub struct ToggleOutcome {
    pub previous: DataMode,
    pub current: DataMode,
    /// Present when the toggle reseeded the document store.
    pub reseed: Option<InitReport>,
}

/// What the admin status endpoint reports.
#[derive(Debug, Clone, Serialize)]
pub struct DatabaseStatus {
    pub mode: DataMode,
    pub access: String,
    /// Only set in document store mode.
    pub db_path: Option<String>,
    pub files: Vec<CollectionFileStat>,
}

/// Runtime context for the data-access layer.
///
/// Owns the configuration, the live [DataMode], the document store and the
/// snapshot caches, and hands out the [DataSource] for a collection
/// according to the mode at call time. Cloning is cheap and clones share
/// all state.
///
/// # Examples
///
/// ```rust,no_run
/// use storefront::collection::CollectionName;
/// use storefront::config::DataConfig;
/// use storefront::filter::Query;
/// use storefront::DataContext;
///
/// let context = DataContext::new(DataConfig::from_env());
/// let products = context.data_source(CollectionName::Products);
/// let books = products.count(&Query::new().eq("category", "Books"))?;
/// # Ok::<(), storefront::errors::StorefrontError>(())
/// ```
#[derive(Clone)]
pub struct DataContext {
    inner: Arc<DataContextInner>,
}

struct DataContextInner {
    config: DataConfig,
    document_mode: AtomicBool,
    store: DocumentStore,
    snapshots: DashMap<CollectionName, Arc<SnapshotSource>>,
}

impl DataContext {
    pub fn new(config: DataConfig) -> Self {
        let fixtures = FixtureSet::new(config.fixtures_dir());
        let store = DocumentStore::new(config.db_path(), fixtures, config.corrupt_threshold());
        log::info!(
            "Data access starting in {} mode (db: {}, fixtures: {})",
            DataMode::from_flag(config.use_document_store()),
            config.db_path().display(),
            config.fixtures_dir().display()
        );
        DataContext {
            inner: Arc::new(DataContextInner {
                document_mode: AtomicBool::new(config.use_document_store()),
                config,
                store,
                snapshots: DashMap::new(),
            }),
        }
    }

    /// Shorthand for `DataContext::new(DataConfig::from_env())`.
    pub fn from_env() -> Self {
        DataContext::new(DataConfig::from_env())
    }

    pub fn config(&self) -> &DataConfig {
        &self.inner.config
    }

    pub fn mode(&self) -> DataMode {
        DataMode::from_flag(self.inner.document_mode.load(Ordering::Acquire))
    }

    pub fn set_mode(&self, mode: DataMode) -> DataMode {
        let previous = self
            .inner
            .document_mode
            .swap(mode == DataMode::DocumentStore, Ordering::AcqRel);
        DataMode::from_flag(previous)
    }

    pub fn is_writable(&self) -> bool {
        self.mode().is_writable()
    }

    pub fn document_store(&self) -> &DocumentStore {
        &self.inner.store
    }

    pub fn fixtures(&self) -> &FixtureSet {
        self.inner.store.fixtures()
    }

    /// The data source for `name` in the current mode.
    pub fn data_source(&self, name: CollectionName) -> Arc<dyn DataSource> {
        match self.mode() {
            DataMode::DocumentStore => Arc::new(DocumentStoreSource::new(self.inner.store.clone(), name)),
            DataMode::Snapshot => self.snapshot(name),
        }
    }

    /// The cached snapshot source for `name`, created on first request.
    pub fn snapshot(&self, name: CollectionName) -> Arc<SnapshotSource> {
        if let Some(source) = self.inner.snapshots.get(&name) {
            return source.clone();
        }
        let source = self.inner.snapshots.entry(name).or_insert_with(|| {
            Arc::new(SnapshotSource::new(name, self.inner.store.fixtures().clone()))
        });
        source.clone()
    }

    /// Flips the mode. Switching to the document store with `reseed`
    /// removes every collection file and seeds all collections with
    /// fixtures again; failures there are logged and reported but do not
    /// undo the toggle. Switching to snapshot mode drops the snapshot
    /// caches so fixtures are read fresh.
    pub fn toggle_mode(&self, reseed: bool) -> ToggleOutcome {
        let was_document = self.inner.document_mode.fetch_xor(true, Ordering::AcqRel);
        let previous = DataMode::from_flag(was_document);
        let next = DataMode::from_flag(!was_document);
        log::info!("Data source switched from {} to {}", previous, next);

        let reseed = match next {
            DataMode::DocumentStore if reseed => Some(self.reseed_document_store()),
            DataMode::DocumentStore => None,
            DataMode::Snapshot => {
                self.inner.snapshots.clear();
                None
            }
        };
        ToggleOutcome {
            previous,
            current: next,
            reseed,
        }
    }

    fn reseed_document_store(&self) -> InitReport {
        match self.inner.store.drop_all_files() {
            Ok(removed) => log::info!("Cleaned up {} database files", removed),
            Err(err) => log::error!("Error cleaning up database files: {}", err),
        }
        let report = self.initialize_all_collections();
        if report.is_success() {
            log::info!("Database reseeded with {} documents", report.seeded_documents());
        }
        report
    }

    /// Initializes every collection that has a fixture file, seeding empty
    /// ones. Failures are logged and listed; the rest still initialize.
    pub fn initialize_all_collections(&self) -> InitReport {
        let mut report = InitReport::default();
        for name in self.fixtures().available() {
            match self.inner.store.collection(name).ensure_ready() {
                Ok(outcome) => report.initialized.push((name, outcome)),
                Err(err) => {
                    log::error!("Error initializing collection {}: {}", name, err);
                    report.failures.push((name, err.to_string()));
                }
            }
        }
        report
    }

    /// Runs the normalizer over every collection. Only available in
    /// document store mode.
    pub fn normalize_all_collections(&self) -> StorefrontResult<NormalizeSummary> {
        if !self.is_writable() {
            log::warn!("Normalization requested in {} mode", self.mode());
            return Err(StorefrontError::unsupported("normalize collections"));
        }
        let summary = normalize_collections(&self.inner.store, &CollectionName::ALL);
        log::info!(
            "Normalization finished: {} collections changed, {} failed",
            summary.reports.iter().filter(|r| !r.is_noop()).count(),
            summary.failures.len()
        );
        Ok(summary)
    }

    pub fn status(&self) -> StorefrontResult<DatabaseStatus> {
        let mode = self.mode();
        let (db_path, files) = match mode {
            DataMode::DocumentStore => (
                Some(self.inner.config.db_path().display().to_string()),
                self.inner.store.file_stats()?,
            ),
            DataMode::Snapshot => (None, Vec::new()),
        };
        Ok(DatabaseStatus {
            mode,
            access: mode.access().to_string(),
            db_path,
            files,
        })
    }

    pub fn service(&self, name: CollectionName) -> EntityService {
        EntityService::new(self.clone(), name)
    }

    pub fn services(&self) -> EntityServices {
        EntityServices::new(self)
    }
}

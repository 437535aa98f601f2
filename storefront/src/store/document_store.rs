use super::collection::DocumentCollection;
use super::persistence::file_name;
use crate::collection::CollectionName;
use crate::common::COLLECTION_FILE_EXTENSION;
use crate::errors::StorefrontResult;
use crate::fixture::FixtureSet;
use chrono::{DateTime, SecondsFormat, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Size and modification time of one collection file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionFileStat {
    pub collection: CollectionName,
    pub file_name: String,
    pub size: u64,
    pub modified: Option<String>,
}

/// Registry of lazily created collection handles over one database directory.
///
/// A handle is created on first request and lives until [DocumentStore::drop_all_files]
/// or process exit. Creating a handle does no I/O; the collection file is
/// loaded (and seeded) on the first operation.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<DocumentStoreInner>,
}

struct DocumentStoreInner {
    db_path: PathBuf,
    fixtures: FixtureSet,
    corrupt_threshold: f64,
    collections: DashMap<CollectionName, Arc<DocumentCollection>>,
}

impl DocumentStore {
    pub fn new(db_path: impl Into<PathBuf>, fixtures: FixtureSet, corrupt_threshold: f64) -> Self {
        DocumentStore {
            inner: Arc::new(DocumentStoreInner {
                db_path: db_path.into(),
                fixtures,
                corrupt_threshold,
                collections: DashMap::new(),
            }),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.inner.db_path
    }

    pub fn fixtures(&self) -> &FixtureSet {
        &self.inner.fixtures
    }

    /// The handle for `name`, created on first request.
    pub fn collection(&self, name: CollectionName) -> Arc<DocumentCollection> {
        if let Some(handle) = self.inner.collections.get(&name) {
            return handle.clone();
        }

        let handle = self.inner.collections.entry(name).or_insert_with(|| {
            Arc::new(DocumentCollection::new(
                name,
                &self.inner.db_path,
                self.inner.fixtures.clone(),
                self.inner.corrupt_threshold,
            ))
        });
        handle.clone()
    }

    /// Names of collections with a live handle.
    pub fn open_collections(&self) -> Vec<CollectionName> {
        let mut names: Vec<CollectionName> =
            self.inner.collections.iter().map(|entry| *entry.key()).collect();
        names.sort();
        names
    }

    /// Drops every handle and removes every collection file. Returns the
    /// number of files removed.
    pub fn drop_all_files(&self) -> StorefrontResult<usize> {
        self.inner.collections.clear();

        let mut removed = 0;
        for name in CollectionName::ALL {
            let path = self.inner.db_path.join(file_name(name));
            match fs::remove_file(&path) {
                Ok(()) => {
                    log::debug!("Removed collection file {}", path.display());
                    removed += 1;
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    log::error!("Failed to remove {}: {}", path.display(), err);
                    return Err(err.into());
                }
            }
        }
        Ok(removed)
    }

    /// Stats of every `.db` file in the database directory that belongs to
    /// a known collection.
    pub fn file_stats(&self) -> StorefrontResult<Vec<CollectionFileStat>> {
        let entries = match fs::read_dir(&self.inner.db_path) {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(err.into()),
        };

        let mut stats = Vec::new();
        for entry in entries {
            let entry = entry?;
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(COLLECTION_FILE_EXTENSION) {
                continue;
            }
            let collection = match path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(|stem| stem.parse::<CollectionName>().ok())
            {
                Some(collection) => collection,
                None => continue,
            };

            let metadata = entry.metadata()?;
            let modified = metadata.modified().ok().map(|time| {
                DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
            });
            stats.push(CollectionFileStat {
                collection,
                file_name: file_name(collection),
                size: metadata.len(),
                modified,
            });
        }
        stats.sort_by_key(|stat| stat.collection);
        Ok(stats)
    }
}

use crate::collection::{CollectionName, Document};
use crate::common::FIXTURE_FILE_EXTENSION;
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// The layout a fixture file was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixtureShape {
    /// `[ {...}, {...} ]`
    PlainArray,
    /// `{ "<collection>": [ {...}, {...} ] }`
    Nested,
    /// `{...}`, a single document
    BareObject,
    /// No fixture file on disk
    Missing,
}

/// Parsed contents of one fixture file, flattened to plain documents.
#[derive(Debug, Clone)]
pub struct Fixture {
    pub collection: CollectionName,
    pub shape: FixtureShape,
    pub documents: Vec<Document>,
}

impl Fixture {
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

/// Directory of `<collection>.json` fixture files shared by both backends.
#[derive(Debug, Clone)]
pub struct FixtureSet {
    dir: PathBuf,
}

impl FixtureSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        FixtureSet { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, collection: CollectionName) -> PathBuf {
        self.dir
            .join(format!("{}.{}", collection.as_str(), FIXTURE_FILE_EXTENSION))
    }

    pub fn exists(&self, collection: CollectionName) -> bool {
        self.path(collection).is_file()
    }

    /// Collections that have a fixture file, in [CollectionName::ALL] order.
    pub fn available(&self) -> Vec<CollectionName> {
        CollectionName::ALL
            .into_iter()
            .filter(|name| self.exists(*name))
            .collect()
    }

    /// Reads and flattens the fixture for `collection`.
    ///
    /// A missing file yields an empty [FixtureShape::Missing] fixture. Any
    /// other read failure or malformed JSON is an error.
    pub fn load(&self, collection: CollectionName) -> StorefrontResult<Fixture> {
        let path = self.path(collection);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "No fixture for collection {} at {}, treating it as empty",
                    collection,
                    path.display()
                );
                return Ok(Fixture {
                    collection,
                    shape: FixtureShape::Missing,
                    documents: Vec::new(),
                });
            }
            Err(err) => {
                log::error!("Failed to read fixture {}: {}", path.display(), err);
                return Err(StorefrontError::new_with_cause(
                    &format!("Failed to read fixture for collection {}", collection),
                    ErrorKind::IOError,
                    err.into(),
                ));
            }
        };

        let value: Value = serde_json::from_str(&content).map_err(|err| {
            log::error!("Malformed fixture {}: {}", path.display(), err);
            StorefrontError::new_with_cause(
                &format!("Malformed fixture for collection {}", collection),
                ErrorKind::EncodingError,
                err.into(),
            )
        })?;

        let (shape, documents) = parse_fixture(collection, value)?;
        log::debug!(
            "Loaded {} documents from fixture {} ({:?})",
            documents.len(),
            path.display(),
            shape
        );
        Ok(Fixture {
            collection,
            shape,
            documents,
        })
    }
}

fn parse_fixture(
    collection: CollectionName,
    value: Value,
) -> StorefrontResult<(FixtureShape, Vec<Document>)> {
    match value {
        Value::Array(items) => Ok((FixtureShape::PlainArray, into_documents(collection, items)?)),
        Value::Object(mut map) => {
            if matches!(map.get(collection.as_str()), Some(Value::Array(_))) {
                if let Some(Value::Array(items)) = map.shift_remove(collection.as_str()) {
                    return Ok((FixtureShape::Nested, into_documents(collection, items)?));
                }
            }
            Ok((FixtureShape::BareObject, vec![Document::from_map(map)]))
        }
        other => Err(StorefrontError::new(
            &format!(
                "Fixture for collection {} must be an array or an object, found {}",
                collection, other
            ),
            ErrorKind::EncodingError,
        )),
    }
}

fn into_documents(collection: CollectionName, items: Vec<Value>) -> StorefrontResult<Vec<Document>> {
    items
        .into_iter()
        .enumerate()
        .map(|(position, item)| {
            Document::try_from_value(item).map_err(|err| {
                StorefrontError::new_with_cause(
                    &format!(
                        "Fixture for collection {} has a non-object element at {}",
                        collection, position
                    ),
                    ErrorKind::EncodingError,
                    err,
                )
            })
        })
        .collect()
}

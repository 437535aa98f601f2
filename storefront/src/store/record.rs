use crate::collection::{CollectionName, Document};
use crate::filter::Query;
use serde_json::{Map, Value};

/// A stored object in one of the two shapes a collection file may hold.
///
/// # Purpose
/// Collections written under the older convention keep all entities inside
/// a single container object, `{ "<collection>": [ ...entities ] }`. Every
/// read and write path matches against both shapes explicitly instead of
/// probing field names at each call site.
#[derive(Debug, Clone, PartialEq)]
pub enum StorageRecord {
    Plain(Document),
    Container {
        collection: CollectionName,
        items: Vec<Document>,
    },
}

impl StorageRecord {
    /// Decides the shape of a stored object. It is a container exactly when
    /// its only field is named after the collection and holds an array of
    /// objects.
    pub fn classify(collection: CollectionName, doc: Document) -> StorageRecord {
        let is_container = doc.size() == 1
            && match doc.as_map().get(collection.as_str()) {
                Some(Value::Array(items)) => items.iter().all(Value::is_object),
                _ => false,
            };
        if !is_container {
            return StorageRecord::Plain(doc);
        }

        let items = match doc.into_map().shift_remove(collection.as_str()) {
            Some(Value::Array(items)) => items
                .into_iter()
                .map(Document::from_json_object)
                .collect(),
            _ => Vec::new(),
        };
        StorageRecord::Container { collection, items }
    }

    pub fn is_container(&self) -> bool {
        matches!(self, StorageRecord::Container { .. })
    }

    pub fn as_plain(&self) -> Option<&Document> {
        match self {
            StorageRecord::Plain(doc) => Some(doc),
            StorageRecord::Container { .. } => None,
        }
    }

    /// Items of a container; empty for a plain document.
    pub fn items(&self) -> &[Document] {
        match self {
            StorageRecord::Container { items, .. } => items,
            StorageRecord::Plain(_) => &[],
        }
    }

    /// Items of a container matching `query`, with their positions.
    pub fn nested_matches<'a>(&'a self, query: &'a Query) -> impl Iterator<Item = (usize, &'a Document)> + 'a {
        self.items()
            .iter()
            .enumerate()
            .filter(move |(_, item)| query.matches(item))
    }

    /// The object as written to disk.
    pub fn to_document(&self) -> Document {
        match self {
            StorageRecord::Plain(doc) => doc.clone(),
            StorageRecord::Container { collection, items } => {
                let mut map = Map::new();
                map.insert(
                    collection.as_str().to_string(),
                    Value::Array(items.iter().map(Document::to_value).collect()),
                );
                Document::from_map(map)
            }
        }
    }
}

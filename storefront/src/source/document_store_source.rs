use super::DataSource;
use crate::collection::{CollectionName, DeleteOptions, Document, FindOptions, UpdateOptions, UpdateSpec};
use crate::errors::{StorefrontError, StorefrontResult};
use crate::filter::Query;
use crate::store::{DocumentCollection, DocumentStore};
use std::sync::Arc;

/// [DataSource] over the file-backed document store.
///
/// The collection handle is looked up on every call, so a source obtained
/// before a full reseed keeps working against the fresh files.
#[derive(Clone)]
pub struct DocumentStoreSource {
    store: DocumentStore,
    name: CollectionName,
}

impl DocumentStoreSource {
    pub fn new(store: DocumentStore, name: CollectionName) -> Self {
        DocumentStoreSource { store, name }
    }

    fn handle(&self) -> Arc<DocumentCollection> {
        self.store.collection(self.name)
    }

    fn logged<T>(&self, operation: &str, result: StorefrontResult<T>) -> StorefrontResult<T> {
        result.map_err(|err: StorefrontError| {
            log::error!(
                "Error in {} for collection {}: {}",
                operation,
                self.name,
                err
            );
            err
        })
    }
}

impl DataSource for DocumentStoreSource {
    fn collection(&self) -> CollectionName {
        self.name
    }

    fn is_writable(&self) -> bool {
        true
    }

    fn find_one(&self, query: &Query) -> StorefrontResult<Option<Document>> {
        self.logged("findOne", self.handle().find_one(query))
    }

    fn find(&self, query: &Query, options: &FindOptions) -> StorefrontResult<Vec<Document>> {
        self.logged("find", self.handle().find(query, options))
    }

    fn count(&self, query: &Query) -> StorefrontResult<usize> {
        self.logged("count", self.handle().count(query))
    }

    fn create(&self, doc: Document) -> StorefrontResult<Document> {
        self.logged("create", self.handle().insert(doc))
    }

    fn update(&self, query: &Query, spec: &UpdateSpec, options: UpdateOptions) -> StorefrontResult<usize> {
        self.logged("update", self.handle().update(query, spec, options))
    }

    fn delete(&self, query: &Query, options: DeleteOptions) -> StorefrontResult<usize> {
        self.logged("delete", self.handle().delete(query, options))
    }

    fn reset(&self) -> StorefrontResult<()> {
        self.logged("reset", self.handle().reset().map(|_| ()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::fixture::FixtureSet;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn delegates_to_collection() {
        let dir = tempdir().unwrap();
        let fixtures = dir.path().join("mock-data");
        fs::create_dir_all(&fixtures).unwrap();
        fs::write(fixtures.join("orders.json"), r#"{"orders":[{"id":"orde_1","customer_id":"cust_1"}]}"#)
            .unwrap();
        let store = DocumentStore::new(dir.path().join("db"), FixtureSet::new(fixtures), 0.1);
        let orders = DocumentStoreSource::new(store.clone(), CollectionName::Orders);

        assert!(orders.is_writable());
        assert_eq!(orders.count(&Query::new().eq("customer_id", "cust_1")).unwrap(), 1);
        orders.create(doc!{ "id": "orde_2", "customer_id": "cust_1" }).unwrap();
        assert_eq!(orders.count(&Query::all()).unwrap(), 2);

        // handles are re-resolved after the files go away
        store.drop_all_files().unwrap();
        assert_eq!(orders.count(&Query::all()).unwrap(), 1);

        orders.delete(&Query::all(), DeleteOptions::default()).unwrap();
        orders.reset().unwrap();
        assert_eq!(orders.find_one(&Query::by_id("orde_1")).unwrap().and_then(|d| d.id().map(String::from)), Some("orde_1".to_string()));
    }

    #[test]
    fn errors_pass_through_unchanged() {
        let dir = tempdir().unwrap();
        let store = DocumentStore::new(dir.path().join("db"), FixtureSet::new(dir.path()), 0.1);
        let customers = DocumentStoreSource::new(store, CollectionName::Customers);
        let err = customers.create(doc!{ "name": "no id" }).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }
}

use super::{ListOptions, Page};
use crate::collection::{CollectionName, DeleteOptions, Document, FindOptions, UpdateOptions, UpdateSpec};
use crate::common::util::{current_time_millis, now_iso};
use crate::common::{CREATED_AT, DOC_ID, UPDATED_AT};
use crate::data_context::DataContext;
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use crate::filter::Query;
use crate::source::DataSource;
use rand::Rng;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// Generates an entity id: the collection prefix, the current unix time in
/// milliseconds and a random number below 1000, e.g. `prod_1718000000000123`.
///
/// Ids are not guaranteed unique; the unique `id` index rejects the rare
/// collision.
pub fn generate_id(collection: CollectionName) -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("{}_{}{}", collection.id_prefix(), current_time_millis(), suffix)
}

/// CRUD operations for one entity collection.
///
/// The backend is resolved on every call, so a mode toggle takes effect
/// immediately for existing services.
#[derive(Clone)]
pub struct EntityService {
    context: DataContext,
    collection: CollectionName,
}

impl EntityService {
    pub fn new(context: DataContext, collection: CollectionName) -> Self {
        EntityService {
            context,
            collection,
        }
    }

    pub fn collection(&self) -> CollectionName {
        self.collection
    }

    fn source(&self) -> Arc<dyn DataSource> {
        self.context.data_source(self.collection)
    }

    pub fn get_by_id(&self, id: &str) -> StorefrontResult<Option<Document>> {
        self.source().find_one(&Query::by_id(id))
    }

    /// [EntityService::get_by_id] deserialized into `T`.
    pub fn get_by_id_as<T: DeserializeOwned>(&self, id: &str) -> StorefrontResult<Option<T>> {
        match self.get_by_id(id)? {
            Some(doc) => serde_json::from_value(doc.into_value()).map(Some).map_err(|err| {
                StorefrontError::new_with_cause(
                    &format!("Document {} of {} does not fit the requested type", id, self.collection),
                    ErrorKind::EncodingError,
                    err.into(),
                )
            }),
            None => Ok(None),
        }
    }

    /// One page of matching documents plus the total number of matches.
    /// The page and the total are read separately.
    pub fn get_all(&self, options: &ListOptions) -> StorefrontResult<Page<Document>> {
        let source = self.source();
        let query = options.query();
        let items = source.find(&query, &options.find_options())?;
        let total = source.count(&query)?;
        Ok(Page {
            items,
            total,
            page: options.page_number(),
            limit: options.page_size(),
        })
    }

    /// Every document whose `field` equals `value`, in storage order.
    pub fn find_by(&self, field: &str, value: impl Into<Value>) -> StorefrontResult<Vec<Document>> {
        self.source()
            .find(&Query::new().eq(field, value), &FindOptions::new())
    }

    /// Every document matching `query`, operators included, in storage
    /// order. The snapshot backend only matches by equality, so there the
    /// query runs in memory over the whole collection.
    pub fn find_matching(&self, query: &Query) -> StorefrontResult<Vec<Document>> {
        let source = self.source();
        if source.is_writable() {
            return source.find(query, &FindOptions::new());
        }
        let all = source.find(&Query::all(), &FindOptions::new())?;
        Ok(all.into_iter().filter(|doc| query.matches(doc)).collect())
    }

    /// Assigns a generated `id` and fresh timestamps, then stores `data`.
    /// Fields present in `data` take precedence over the generated ones.
    pub fn create(&self, data: Document) -> StorefrontResult<Document> {
        let now = now_iso();
        let mut entity = Document::new();
        entity.put(DOC_ID, generate_id(self.collection))?;
        entity.put(CREATED_AT, now.as_str())?;
        entity.put(UPDATED_AT, now.as_str())?;
        entity.merge(&data);
        self.source().create(entity)
    }

    /// Merges `changes` into the entity and returns its state after the
    /// write, or `None` when no entity has this id. `id` and `created_at`
    /// cannot be changed.
    pub fn update(&self, id: &str, changes: Document) -> StorefrontResult<Option<Document>> {
        let mut changes = changes;
        changes.remove(DOC_ID);
        changes.remove(CREATED_AT);
        changes.put(UPDATED_AT, now_iso())?;

        let source = self.source();
        let query = Query::by_id(id);
        let updated = source.update(&query, &UpdateSpec::set(changes), UpdateOptions::default())?;
        if updated == 0 {
            return Ok(None);
        }
        source.find_one(&query)
    }

    /// True when something was removed.
    pub fn delete(&self, id: &str) -> StorefrontResult<bool> {
        let removed = self
            .source()
            .delete(&Query::by_id(id), DeleteOptions::default())?;
        Ok(removed > 0)
    }

    pub fn reset(&self) -> StorefrontResult<()> {
        self.source().reset()
    }
}

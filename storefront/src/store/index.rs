use crate::collection::{CollectionName, Document};
use crate::common::util::index_key;
use crate::common::DOC_ID;
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Field and uniqueness of one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexSpec {
    pub field: &'static str,
    pub unique: bool,
}

const fn unique(field: &'static str) -> IndexSpec {
    IndexSpec { field, unique: true }
}

const fn non_unique(field: &'static str) -> IndexSpec {
    IndexSpec { field, unique: false }
}

/// Indexes created for a collection on first access. Every collection gets
/// a unique index on `id`.
pub fn index_specs(collection: CollectionName) -> Vec<IndexSpec> {
    let mut specs = vec![unique(DOC_ID)];
    match collection {
        CollectionName::Products => specs.push(non_unique("category")),
        CollectionName::Categories => {
            specs.push(unique("slug"));
            specs.push(non_unique("parent_id"));
        }
        CollectionName::Customers => specs.push(unique("email")),
        CollectionName::Orders
        | CollectionName::Carts
        | CollectionName::Wishlists
        | CollectionName::Reviews
        | CollectionName::Returns
        | CollectionName::Notifications
        | CollectionName::SupportTickets => specs.push(non_unique("customer_id")),
        CollectionName::AuthTokens => {
            specs.push(unique("token"));
            specs.push(non_unique("customer_id"));
        }
        CollectionName::OtpSessions => specs.push(non_unique("phone")),
        CollectionName::Promotions | CollectionName::Faq | CollectionName::Payments => {}
    }
    specs
}

/// Sparse index over one field of the plain documents in a collection.
/// Documents missing the field, or holding an array or object there, are
/// not indexed.
#[derive(Debug)]
pub(crate) struct FieldIndex {
    spec: IndexSpec,
    entries: HashMap<String, BTreeSet<u64>>,
}

impl FieldIndex {
    pub fn new(spec: IndexSpec) -> Self {
        FieldIndex {
            spec,
            entries: HashMap::new(),
        }
    }

    pub fn field(&self) -> &str {
        self.spec.field
    }

    fn key_of(&self, doc: &Document) -> Option<String> {
        doc.get(self.spec.field).and_then(index_key)
    }

    pub fn insert(&mut self, record_id: u64, doc: &Document) {
        if let Some(key) = self.key_of(doc) {
            self.entries.entry(key).or_default().insert(record_id);
        }
    }

    pub fn remove(&mut self, record_id: u64, doc: &Document) {
        if let Some(key) = self.key_of(doc) {
            if let Some(ids) = self.entries.get_mut(&key) {
                ids.remove(&record_id);
                if ids.is_empty() {
                    self.entries.remove(&key);
                }
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn lookup(&self, key: &str) -> BTreeSet<u64> {
        self.entries.get(key).cloned().unwrap_or_default()
    }

    /// Checks that writing `incoming` (record id, new content) keeps the
    /// index unique. Records listed in `incoming` are treated as replaced,
    /// so updating a document in place never conflicts with itself.
    pub fn check_unique(&self, collection: CollectionName, incoming: &[(u64, &Document)]) -> StorefrontResult<()> {
        if !self.spec.unique {
            return Ok(());
        }

        let replaced: HashSet<u64> = incoming.iter().map(|(record_id, _)| *record_id).collect();
        let mut seen: HashSet<String> = HashSet::new();
        for (_, doc) in incoming {
            let key = match self.key_of(doc) {
                Some(key) => key,
                None => continue,
            };
            let taken = self
                .entries
                .get(&key)
                .is_some_and(|ids| ids.iter().any(|id| !replaced.contains(id)));
            if taken || !seen.insert(key) {
                let value = doc.get(self.spec.field).map(|v| v.to_string()).unwrap_or_default();
                log::error!(
                    "Unique constraint violated in {}: {} = {}",
                    collection,
                    self.spec.field,
                    value
                );
                return Err(StorefrontError::new(
                    &format!(
                        "Unique constraint violated for field '{}' with value {} in collection {}",
                        self.spec.field, value, collection
                    ),
                    ErrorKind::UniqueConstraintViolation,
                ));
            }
        }
        Ok(())
    }
}

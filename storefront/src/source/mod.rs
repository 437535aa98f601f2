//! The query interface shared by both backends.
use crate::collection::{CollectionName, DeleteOptions, Document, FindOptions, UpdateOptions, UpdateSpec};
use crate::errors::StorefrontResult;
use crate::filter::Query;

mod document_store_source;
mod snapshot_source;

pub use document_store_source::*;
pub use snapshot_source::*;

/// Read and write access to one collection, independent of the backend.
///
/// Reads behave identically on every backend given the same fixture data:
/// same documents, same order, same totals. Writes are a capability the
/// read-only snapshot backend declines with
/// [ErrorKind::UnsupportedOperation](crate::errors::ErrorKind::UnsupportedOperation);
/// check [DataSource::is_writable] before mutating.
///
/// Both plain documents and items of legacy container records take part in
/// every operation.
pub trait DataSource: Send + Sync {
    fn collection(&self) -> CollectionName;

    /// Whether `create`, `update` and `delete` are supported.
    fn is_writable(&self) -> bool;

    /// The first document matching `query`, or `None`.
    fn find_one(&self, query: &Query) -> StorefrontResult<Option<Document>>;

    /// Every match, then sorted, skipped, limited and projected.
    fn find(&self, query: &Query, options: &FindOptions) -> StorefrontResult<Vec<Document>>;

    /// Number of matches, nested items included. Equals the length of
    /// `find(query)` without options.
    fn count(&self, query: &Query) -> StorefrontResult<usize>;

    /// Inserts `doc` and returns it as stored.
    fn create(&self, doc: Document) -> StorefrontResult<Document>;

    /// Number of documents changed.
    fn update(&self, query: &Query, spec: &UpdateSpec, options: UpdateOptions) -> StorefrontResult<usize>;

    /// Number of documents removed.
    fn delete(&self, query: &Query, options: DeleteOptions) -> StorefrontResult<usize>;

    /// Document store: reseed from the fixture. Snapshot: drop the cache.
    fn reset(&self) -> StorefrontResult<()>;
}

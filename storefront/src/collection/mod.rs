//! Collections and documents for schema-less data.
//!
//! A [Document] is an ordered JSON object; a [CollectionName] names one
//! group of documents of the same kind. [FindOptions], [UpdateSpec],
//! [UpdateOptions] and [DeleteOptions] describe what a query or command
//! does, independent of which backend executes it.

mod collection_name;
mod document;
mod find_options;
mod update_options;

pub use collection_name::*;
pub use document::*;
pub use find_options::*;
pub use update_options::*;

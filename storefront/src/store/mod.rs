//! The file-backed document store.
//!
//! Each collection lives in `<db_path>/<collection>.db`, an append-only file
//! of JSON lines replayed into memory on first access. Collections are
//! seeded from their fixtures when the file is empty, keep sparse field
//! indexes over plain documents and understand the legacy container shape.
mod collection;
mod document_store;
mod index;
mod persistence;
mod record;

pub use collection::*;
pub use document_store::*;
pub use index::{index_specs, IndexSpec};
pub use record::*;

//! One-shot migration of legacy collection layouts.
//!
//! Older fixtures and collection files keep every entity of a collection in
//! a single container object, `{ "<collection>": [ ...entities ] }`. The
//! normalizer rewrites such collections so each entity is its own document.
//!
//! ```rust,ignore
//! use storefront::migration::normalize_collection;
//!
//! let report = normalize_collection(&store, CollectionName::Products)?;
//! assert!(normalize_collection(&store, CollectionName::Products)?.is_noop());
//! ```

mod normalizer;

pub use normalizer::*;

//! # Storefront - Dual-Mode Data Access
//!
//! Data-access layer for a mock e-commerce API. Every entity collection
//! (products, customers, orders, ...) is reachable through one
//! [DataSource](source::DataSource) interface backed by either:
//!
//! - **Document store**: one append-only JSON-lines file per collection,
//!   seeded from the collection's fixture on first use, read-write.
//! - **Snapshot**: the fixture files themselves, loaded into memory,
//!   read-only.
//!
//! The active backend lives in a [DataContext] and can be toggled at
//! runtime. Reads return the same documents in the same order on both
//! backends.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use storefront::collection::CollectionName;
//! use storefront::config::DataConfig;
//! use storefront::service::ListOptions;
//! use storefront::{doc, DataContext};
//!
//! # fn main() -> Result<(), storefront::errors::StorefrontError> {
//! let context = DataContext::new(DataConfig::from_env());
//! let customers = context.service(CollectionName::Customers);
//!
//! let created = customers.create(doc!{ "email": "ada@example.com", "name": "Ada" })?;
//! let page = customers.get_all(&ListOptions::new().limit(5))?;
//! assert!(page.total >= 1);
//! # let _ = created;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`collection`] - Documents, collection names and query/command options
//! - [`common`] - Constants, sort order and value helpers
//! - [`config`] - Environment-driven configuration
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Queries and comparison operators
//! - [`fixture`] - Fixture file loading
//! - [`migration`] - Nested-array normalization
//! - [`service`] - Entity CRUD services, paging
//! - [`source`] - The backend-independent query interface and its adapters
//! - [`store`] - The file-backed document store

pub mod collection;
pub mod common;
pub mod config;
mod data_context;
pub mod errors;
pub mod filter;
pub mod fixture;
pub mod migration;
pub mod service;
pub mod source;
pub mod store;

pub use data_context::*;
pub use serde_json;

#[cfg(test)]
#[ctor::ctor]
fn init() {
    colog::init();
}

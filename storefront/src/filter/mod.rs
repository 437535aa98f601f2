//! Query documents evaluated against collection records.
//!
//! A query is a JSON object mapping field paths to conditions. Plain values
//! mean equality. Objects made of `$` operators (`$lt`, `$lte`, `$gt`,
//! `$gte`, `$ne`, `$in`, `$nin`, `$exists`) are honoured by the document
//! store; the snapshot backend evaluates equality only.
mod comparison;
mod query;

pub use comparison::*;
pub use query::*;

//! Shared constants, sort direction and value helpers.

mod constants;
mod sort_order;
pub mod util;

pub use constants::*;
pub use sort_order::*;

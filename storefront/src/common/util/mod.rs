mod date_utils;
mod value_utils;

pub use date_utils::*;
pub use value_utils::*;

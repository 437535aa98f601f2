use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Specifies the direction for sorting documents.
///
/// Maps onto the `1` / `-1` convention used by query-string style sort
/// documents (`{ "price": 1 }`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in ascending order (smallest to largest, A-Z, oldest to newest)
    Ascending,
    /// Sort in descending order (largest to smallest, Z-A, newest to oldest)
    Descending,
}

impl SortOrder {
    /// Parses the numeric direction form. Anything negative is descending.
    pub fn from_direction(direction: i64) -> SortOrder {
        if direction < 0 {
            SortOrder::Descending
        } else {
            SortOrder::Ascending
        }
    }

    pub fn direction(&self) -> i64 {
        match self {
            SortOrder::Ascending => 1,
            SortOrder::Descending => -1,
        }
    }
}

impl Display for SortOrder {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for SortOrder {
    type Err = StorefrontError;

    fn from_str(s: &str) -> StorefrontResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(SortOrder::Ascending),
            "desc" | "descending" | "-1" => Ok(SortOrder::Descending),
            other => Err(StorefrontError::new(
                &format!("Unknown sort order '{}'", other),
                ErrorKind::FilterError,
            )),
        }
    }
}

use crate::collection::{Document, FindOptions};
use crate::common::{SortOrder, DEFAULT_PAGE, DEFAULT_PAGE_SIZE, DEFAULT_SORT_FIELD};
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use crate::filter::Query;
use serde::Serialize;
use serde_json::Value;

const PAGE_PARAM: &str = "page";
const LIMIT_PARAM: &str = "limit";
const SORT_BY_PARAM: &str = "sort_by";
const SORT_ORDER_PARAM: &str = "sort_order";

/// Paging, sorting and equality filters for [EntityService::get_all](super::EntityService::get_all).
///
/// Defaults: page 1, 10 per page, newest `created_at` first.
#[derive(Debug, Clone, PartialEq)]
pub struct ListOptions {
    page: u64,
    limit: u64,
    sort_by: String,
    sort_order: SortOrder,
    filters: Vec<(String, Value)>,
}

impl Default for ListOptions {
    fn default() -> Self {
        ListOptions {
            page: DEFAULT_PAGE,
            limit: DEFAULT_PAGE_SIZE,
            sort_by: DEFAULT_SORT_FIELD.to_string(),
            sort_order: SortOrder::Descending,
            filters: Vec::new(),
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        ListOptions::default()
    }

    /// 1-based; 0 is treated as 1.
    pub fn page(mut self, page: u64) -> Self {
        self.page = page.max(1);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort_by = field.to_string();
        self.sort_order = order;
        self
    }

    /// Adds an equality filter on `field`, which may be a dotted path.
    /// A later filter on the same field replaces the earlier one; `null`
    /// values are ignored.
    pub fn filter(mut self, field: &str, value: impl Into<Value>) -> Self {
        let value = value.into();
        if value.is_null() {
            return self;
        }
        match self.filters.iter_mut().find(|(name, _)| name == field) {
            Some(existing) => existing.1 = value,
            None => self.filters.push((field.to_string(), value)),
        }
        self
    }

    /// Builds options from a query-string style document: `page`, `limit`,
    /// `sort_by` and `sort_order` are taken out, every other non-null entry
    /// becomes an equality filter. Numbers may be given as strings.
    pub fn from_params(params: &Document) -> StorefrontResult<Self> {
        let mut options = ListOptions::default();
        for (key, value) in params.iter() {
            match key.as_str() {
                PAGE_PARAM => options = options.page(parse_count(PAGE_PARAM, value)?),
                LIMIT_PARAM => options.limit = parse_count(LIMIT_PARAM, value)?,
                SORT_BY_PARAM => {
                    if let Some(field) = value.as_str().filter(|s| !s.is_empty()) {
                        options.sort_by = field.to_string();
                    }
                }
                SORT_ORDER_PARAM => options.sort_order = parse_order(value),
                _ => options = options.filter(key, value.clone()),
            }
        }
        Ok(options)
    }

    pub fn page_number(&self) -> u64 {
        self.page
    }

    pub fn page_size(&self) -> u64 {
        self.limit
    }

    pub fn sort_field(&self) -> &str {
        &self.sort_by
    }

    pub fn sort_order(&self) -> SortOrder {
        self.sort_order
    }

    pub fn filters(&self) -> &[(String, Value)] {
        &self.filters
    }

    pub(crate) fn query(&self) -> Query {
        self.filters
            .iter()
            .fold(Query::new(), |query, (field, value)| query.eq(field, value.clone()))
    }

    pub(crate) fn find_options(&self) -> FindOptions {
        let skip = (self.page.saturating_sub(1)).saturating_mul(self.limit);
        FindOptions::new()
            .sort_by(&self.sort_by, self.sort_order)
            .skip(usize::try_from(skip).unwrap_or(usize::MAX))
            .limit(usize::try_from(self.limit).unwrap_or(usize::MAX))
    }
}

fn parse_count(param: &str, value: &Value) -> StorefrontResult<u64> {
    let parsed = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| {
        StorefrontError::new(
            &format!("Parameter '{}' must be a non-negative integer, got {}", param, value),
            ErrorKind::ValidationError,
        )
    })
}

/// `"asc"` (or any ascending spelling) sorts ascending; everything else descending.
fn parse_order(value: &Value) -> SortOrder {
    match value {
        Value::String(s) => s.parse::<SortOrder>().unwrap_or(SortOrder::Descending),
        Value::Number(n) => SortOrder::from_direction(n.as_i64().unwrap_or(-1)),
        _ => SortOrder::Descending,
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: usize,
    pub page: u64,
    pub limit: u64,
}

impl<T> Page<T> {
    pub fn total_pages(&self) -> u64 {
        if self.limit == 0 {
            return 0;
        }
        (self.total as u64).div_ceil(self.limit)
    }

    pub fn has_next(&self) -> bool {
        self.page < self.total_pages()
    }
}

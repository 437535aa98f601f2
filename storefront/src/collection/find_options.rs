use crate::collection::Document;
use crate::common::util::compare_values;
use crate::common::SortOrder;
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use indexmap::IndexMap;
use serde_json::Value;
use std::cmp::Ordering;

/// Ordered list of sort keys. Earlier keys take precedence.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortSpec {
    fields: Vec<(String, SortOrder)>,
}

impl SortSpec {
    pub fn new() -> Self {
        SortSpec { fields: Vec::new() }
    }

    pub fn add_sorted_field(mut self, field_name: impl Into<String>, sort_order: SortOrder) -> Self {
        self.fields.push((field_name.into(), sort_order));
        self
    }

    pub fn sorting_order(&self) -> &[(String, SortOrder)] {
        &self.fields
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parses the `{ "price": 1, "name": -1 }` form.
    pub fn from_document(spec: &Document) -> StorefrontResult<Self> {
        let mut sort = SortSpec::new();
        for (field, direction) in spec.iter() {
            let order = match direction {
                Value::Number(n) => SortOrder::from_direction(n.as_i64().unwrap_or(1)),
                Value::String(s) => s.parse::<SortOrder>()?,
                other => {
                    return Err(StorefrontError::new(
                        &format!("Invalid sort direction {} for field '{}'", other, field),
                        ErrorKind::FilterError,
                    ))
                }
            };
            sort = sort.add_sorted_field(field.clone(), order);
        }
        Ok(sort)
    }

    /// Stable multi-key comparison of two documents.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for (field, order) in &self.fields {
            let ordering = compare_values(a.get(field), b.get(field));
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

/// Field projection applied after paging.
///
/// If any field is marked for inclusion the projection keeps only included
/// fields; otherwise it drops the excluded ones.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Projection {
    fields: IndexMap<String, bool>,
}

impl Projection {
    pub fn new() -> Self {
        Projection { fields: IndexMap::new() }
    }

    pub fn include(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), true);
        self
    }

    pub fn exclude(mut self, field: impl Into<String>) -> Self {
        self.fields.insert(field.into(), false);
        self
    }

    /// Parses the `{ "name": 1, "price": 1 }` / `{ "internal_notes": 0 }` form.
    pub fn from_document(spec: &Document) -> Self {
        let mut projection = Projection::new();
        for (field, flag) in spec.iter() {
            let include = match flag {
                Value::Bool(b) => *b,
                Value::Number(n) => n.as_f64().unwrap_or(0.0) != 0.0,
                _ => false,
            };
            projection.fields.insert(field.clone(), include);
        }
        projection
    }

    fn include_mode(&self) -> bool {
        self.fields.values().any(|include| *include)
    }

    pub fn apply(&self, doc: Document) -> Document {
        if self.include_mode() {
            let mut projected = Document::new();
            for (field, include) in &self.fields {
                if !*include {
                    continue;
                }
                if let Some(value) = doc.as_map().get(field) {
                    let _ = projected.put(field, value.clone());
                }
            }
            projected
        } else {
            let mut map = doc.into_map();
            for field in self.fields.keys() {
                map.shift_remove(field);
            }
            Document::from_map(map)
        }
    }
}

/// Options for controlling find operations on documents.
///
/// The same pipeline runs on both backends: sort, then skip, then limit,
/// then projection.
///
/// # Examples
///
/// ```rust
/// use storefront::collection::{FindOptions, order_by};
/// use storefront::common::SortOrder;
///
/// let options = order_by("price", SortOrder::Ascending).skip(10).limit(20);
/// assert_eq!(options.skip_count(), Some(10));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) sort_by: Option<SortSpec>,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
    pub(crate) projection: Option<Projection>,
}

/// Creates `FindOptions` with sorting by a field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skips a number of results.
pub fn skip_by(skip: usize) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` that limits the number of results.
pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions {
            sort_by: None,
            skip: None,
            limit: None,
            projection: None,
        }
    }

    pub fn skip(mut self, skip: usize) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let fields = self.sort_by.unwrap_or_default();
        self.sort_by = Some(fields.add_sorted_field(field_name, sort_order));
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> FindOptions {
        self.sort_by = Some(sort);
        self
    }

    pub fn projection(mut self, projection: Projection) -> FindOptions {
        self.projection = Some(projection);
        self
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort_by.as_ref()
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<usize> {
        self.limit
    }

    /// Runs sort, skip, limit and projection over already-filtered documents.
    pub fn apply(&self, mut docs: Vec<Document>) -> Vec<Document> {
        if let Some(sort) = self.sort_by.as_ref().filter(|s| !s.is_empty()) {
            // Vec::sort_by is stable, equal keys keep storage order
            docs.sort_by(|a, b| sort.compare(a, b));
        }

        let skip = self.skip.unwrap_or(0);
        let iter = docs.into_iter().skip(skip);
        let paged: Vec<Document> = match self.limit {
            Some(limit) => iter.take(limit).collect(),
            None => iter.collect(),
        };

        match &self.projection {
            Some(projection) => paged.into_iter().map(|doc| projection.apply(doc)).collect(),
            None => paged,
        }
    }
}

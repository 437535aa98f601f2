use super::ComparisonOp;
use crate::collection::Document;
use crate::common::util::{index_key, values_equal};
use crate::common::DOC_ID;
use crate::errors::StorefrontResult;
use indexmap::IndexMap;
use serde_json::Value;
use std::fmt::{Display, Formatter};

/// One field condition inside a [Query].
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// The field must equal the value.
    Equals(Value),
    /// Every operator must hold. `raw` keeps the original condition object
    /// for backends that only understand equality.
    Operators {
        raw: Value,
        ops: Vec<(ComparisonOp, Value)>,
    },
}

impl Condition {
    fn matches(&self, field: Option<&Value>) -> bool {
        match self {
            Condition::Equals(expected) => values_equal(field, expected),
            Condition::Operators { ops, .. } => ops.iter().all(|(op, operand)| op.evaluate(field, operand)),
        }
    }

    fn matches_equality(&self, field: Option<&Value>) -> bool {
        match self {
            Condition::Equals(expected) => values_equal(field, expected),
            Condition::Operators { raw, .. } => values_equal(field, raw),
        }
    }
}

/// A logical AND over field conditions. An empty query matches everything.
///
/// # Examples
///
/// ```rust
/// use storefront::doc;
/// use storefront::filter::Query;
///
/// let query = Query::by_id("prod_001");
/// assert!(query.matches(&doc!{ "id": "prod_001", "price": 9.99 }));
///
/// let recent = Query::from_document(&doc!{ "created_at": { "$gte": "2024-01-01" } }).unwrap();
/// assert!(recent.matches(&doc!{ "created_at": "2024-02-03T00:00:00.000Z" }));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    conditions: IndexMap<String, Condition>,
}

impl Query {
    /// The empty query.
    pub fn all() -> Self {
        Query {
            conditions: IndexMap::new(),
        }
    }

    pub fn new() -> Self {
        Query::all()
    }

    /// `{ "id": id }`
    pub fn by_id(id: &str) -> Self {
        Query::new().eq(DOC_ID, id)
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions
            .insert(field.to_string(), Condition::Equals(value.into()));
        self
    }

    /// Adds an operator condition, merging with operators already present
    /// on the same field.
    pub fn with(mut self, field: &str, op: ComparisonOp, operand: impl Into<Value>) -> Self {
        let operand = operand.into();
        let entry = self.conditions.shift_remove(field);
        let (mut raw, mut ops) = match entry {
            Some(Condition::Operators { raw, ops }) => (raw, ops),
            _ => (Value::Object(Default::default()), Vec::new()),
        };
        if let Value::Object(map) = &mut raw {
            map.insert(op.to_string(), operand.clone());
        }
        ops.push((op, operand));
        self.conditions
            .insert(field.to_string(), Condition::Operators { raw, ops });
        self
    }

    /// Parses the JSON form. A field whose value is an object made only of
    /// `$` keys becomes an operator condition; anything else is equality.
    pub fn from_document(doc: &Document) -> StorefrontResult<Self> {
        let mut query = Query::all();
        for (field, value) in doc.iter() {
            let condition = match value {
                Value::Object(map) if !map.is_empty() && map.keys().all(|k| k.starts_with('$')) => {
                    let mut ops = Vec::with_capacity(map.len());
                    for (token, operand) in map {
                        let op = ComparisonOp::parse(token)?;
                        op.validate_operand(operand)?;
                        ops.push((op, operand.clone()));
                    }
                    Condition::Operators {
                        raw: value.clone(),
                        ops,
                    }
                }
                _ => Condition::Equals(value.clone()),
            };
            query.conditions.insert(field.clone(), condition);
        }
        Ok(query)
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&String, &Condition)> {
        self.conditions.iter()
    }

    /// Full evaluation with comparison operators honoured.
    pub fn matches(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches(doc.get(field)))
    }

    /// Equality-only evaluation: operator objects are compared as plain values.
    pub fn matches_equality(&self, doc: &Document) -> bool {
        self.conditions
            .iter()
            .all(|(field, condition)| condition.matches_equality(doc.get(field)))
    }

    /// Scalar equality conditions, usable for index lookups, as `(field, key)`.
    pub(crate) fn indexable_equalities(&self) -> Vec<(&str, String)> {
        self.conditions
            .iter()
            .filter_map(|(field, condition)| match condition {
                Condition::Equals(value) => index_key(value).map(|key| (field.as_str(), key)),
                _ => None,
            })
            .collect()
    }

    /// Seed document for an upsert: every equality condition on a plain field.
    pub(crate) fn equality_document(&self) -> Document {
        let mut doc = Document::new();
        for (field, condition) in &self.conditions {
            if let Condition::Equals(value) = condition {
                let _ = doc.put(field, value.clone());
            }
        }
        doc
    }
}

impl Display for Query {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut map = serde_json::Map::new();
        for (field, condition) in &self.conditions {
            let value = match condition {
                Condition::Equals(value) => value.clone(),
                Condition::Operators { raw, .. } => raw.clone(),
            };
            map.insert(field.clone(), value);
        }
        write!(f, "{}", Value::Object(map))
    }
}

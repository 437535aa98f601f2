use crate::common::util::lookup_path;
use crate::common::{CREATED_AT, DOC_ID, FIELD_SEPARATOR, UPDATED_AT};
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Debug, Display};

/// A schema-less record: an insertion-ordered map from field name to JSON value.
///
/// The data-access layer only interprets three fields, `id`, `created_at`
/// and `updated_at`; everything else is carried through untouched.
///
/// Nested values can be read with dot separated paths, e.g. `"address.city"`
/// or `"items.0.sku"`.
///
/// # Examples
///
/// ```rust
/// use storefront::doc;
///
/// let doc = doc!{ "id": "prod_001", "price": 9.99, "dimensions": { "width": 3 } };
/// assert_eq!(doc.id(), Some("prod_001"));
/// assert_eq!(doc.get("dimensions.width").and_then(|v| v.as_i64()), Some(3));
/// ```
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Document {
    data: Map<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document { data: Map::new() }
    }

    /// Wraps an existing JSON object.
    pub fn from_map(data: Map<String, Value>) -> Self {
        Document { data }
    }

    /// Converts a JSON value into a document. Only objects are accepted.
    pub fn try_from_value(value: Value) -> StorefrontResult<Self> {
        match value {
            Value::Object(data) => Ok(Document { data }),
            other => {
                log::error!("Expected a JSON object but found {}", other);
                Err(StorefrontError::new(
                    &format!("Expected a JSON object but found {}", json_type(&other)),
                    ErrorKind::EncodingError,
                ))
            }
        }
    }

    #[doc(hidden)]
    pub fn from_json_object(value: Value) -> Self {
        match value {
            Value::Object(data) => Document { data },
            _ => Document::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`. A dotted key writes into (and creates)
    /// embedded objects.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is empty or a path segment runs into a
    /// non-object value.
    pub fn put(&mut self, key: &str, value: impl Into<Value>) -> StorefrontResult<()> {
        if key.is_empty() {
            log::error!("Document does not support empty key");
            return Err(StorefrontError::new(
                "Document does not support empty key",
                ErrorKind::InvalidOperation,
            ));
        }

        let value = value.into();
        if !key.contains(FIELD_SEPARATOR) {
            self.data.insert(key.to_string(), value);
            return Ok(());
        }

        let segments: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return Ok(()),
        };
        let mut current = &mut self.data;
        for segment in parents {
            let entry = current
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            current = match entry {
                Value::Object(inner) => inner,
                _ => {
                    return Err(StorefrontError::new(
                        &format!("Cannot write '{}': '{}' is not an object", key, segment),
                        ErrorKind::InvalidOperation,
                    ))
                }
            };
        }
        current.insert(last.to_string(), value);
        Ok(())
    }

    /// Returns the value at `path`, or `None` when absent.
    pub fn get(&self, path: &str) -> Option<&Value> {
        lookup_path(&self.data, path)
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Removes the field at `path`, returning its previous value. A literal
    /// top-level key wins over a dotted path, as in [Document::get].
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        if self.data.contains_key(path) || !path.contains(FIELD_SEPARATOR) {
            return self.data.shift_remove(path);
        }

        let segments: Vec<&str> = path.split(FIELD_SEPARATOR).collect();
        let (last, parents) = segments.split_last()?;
        let mut current = &mut self.data;
        for segment in parents {
            current = match current.get_mut(*segment) {
                Some(Value::Object(inner)) => inner,
                _ => return None,
            };
        }
        current.shift_remove(*last)
    }

    /// The caller-visible identifier, if present and a string.
    pub fn id(&self) -> Option<&str> {
        self.get_str(DOC_ID)
    }

    pub fn has_id(&self) -> bool {
        self.id().is_some()
    }

    pub fn created_at(&self) -> Option<&str> {
        self.get_str(CREATED_AT)
    }

    pub fn updated_at(&self) -> Option<&str> {
        self.get_str(UPDATED_AT)
    }

    pub fn fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn iter(&self) -> serde_json::map::Iter<'_> {
        self.data.iter()
    }

    /// Shallow merge: every top-level field of `other` overwrites the field here.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.data
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.data
    }

    pub fn to_value(&self) -> Value {
        Value::Object(self.data.clone())
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.data)
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

impl From<Map<String, Value>> for Document {
    fn from(data: Map<String, Value>) -> Self {
        Document { data }
    }
}

impl From<Document> for Value {
    fn from(doc: Document) -> Self {
        doc.into_value()
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = serde_json::map::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.data.clone()))
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", Value::Object(self.data.clone()))
    }
}

/// Builds a [Document] from JSON-style key/value pairs.
///
/// ```rust
/// use storefront::doc;
///
/// let empty = doc!{};
/// assert!(empty.is_empty());
///
/// let customer = doc!{ "id": "cust_010", "tags": ["vip"], "address": { "city": "Lyon" } };
/// assert_eq!(customer.size(), 3);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($body:tt)+) => {
        $crate::collection::Document::from_json_object($crate::serde_json::json!({ $($body)+ }))
    };
}

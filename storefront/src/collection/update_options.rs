use crate::collection::Document;
use crate::common::{CREATED_AT, DOC_ID, INC_OPERATOR, SET_OPERATOR, UNSET_OPERATOR};
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use serde_json::{Number, Value};

/// Options for controlling update operations on documents.
///
/// By default an update changes at most one document, counting plain
/// documents and nested-array items together.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOptions {
    multi: bool,
    upsert: bool,
}

impl UpdateOptions {
    pub fn new(multi: bool, upsert: bool) -> Self {
        Self { multi, upsert }
    }

    /// Whether every matching document is updated.
    pub fn is_multi(&self) -> bool {
        self.multi
    }

    /// Whether a document is inserted when nothing matches.
    pub fn is_upsert(&self) -> bool {
        self.upsert
    }
}

/// Creates `UpdateOptions` that update every matching document.
pub fn update_all() -> UpdateOptions {
    UpdateOptions::new(true, false)
}

/// Creates `UpdateOptions` that insert a document when nothing matches.
pub fn upsert() -> UpdateOptions {
    UpdateOptions::new(false, true)
}

/// Options for delete operations. Deletes remove every match unless
/// restricted to one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOptions {
    multi: bool,
}

impl DeleteOptions {
    pub fn new(multi: bool) -> Self {
        Self { multi }
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }
}

impl Default for DeleteOptions {
    fn default() -> Self {
        DeleteOptions { multi: true }
    }
}

/// Creates `DeleteOptions` that remove only the first match.
pub fn delete_one() -> DeleteOptions {
    DeleteOptions::new(false)
}

/// What an update does to each matched document.
///
/// A document whose keys are all update operators becomes
/// [UpdateSpec::Operators]; a document without operator keys replaces the
/// matched document wholesale (keeping its `id` and `created_at` unless the
/// replacement sets them).
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateSpec {
    Operators(UpdateOperators),
    Replace(Document),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOperators {
    set: Vec<(String, Value)>,
    unset: Vec<String>,
    inc: Vec<(String, Number)>,
}

impl UpdateSpec {
    /// `{ "$set": fields }`. Dotted keys address embedded fields.
    pub fn set(fields: Document) -> Self {
        UpdateSpec::Operators(UpdateOperators {
            set: fields.into_map().into_iter().collect(),
            ..Default::default()
        })
    }

    pub fn replace(doc: Document) -> Self {
        UpdateSpec::Replace(doc)
    }

    pub fn from_document(spec: &Document) -> StorefrontResult<Self> {
        let operator_keys = spec.iter().filter(|(key, _)| key.starts_with('$')).count();
        if operator_keys == 0 {
            return Ok(UpdateSpec::Replace(spec.clone()));
        }
        if operator_keys != spec.size() {
            log::error!("Update spec mixes operators and fields: {}", spec);
            return Err(StorefrontError::new(
                "An update cannot mix modifier operators with plain fields",
                ErrorKind::InvalidOperation,
            ));
        }

        let mut operators = UpdateOperators::default();
        for (key, value) in spec.iter() {
            let fields = match value {
                Value::Object(map) => map,
                _ => {
                    return Err(StorefrontError::new(
                        &format!("Modifier {} expects an object", key),
                        ErrorKind::InvalidOperation,
                    ))
                }
            };
            match key.as_str() {
                SET_OPERATOR => operators
                    .set
                    .extend(fields.iter().map(|(field, value)| (field.clone(), value.clone()))),
                UNSET_OPERATOR => operators.unset.extend(fields.keys().cloned()),
                INC_OPERATOR => {
                    for (field, value) in fields {
                        match value {
                            Value::Number(n) => operators.inc.push((field.clone(), n.clone())),
                            _ => {
                                return Err(StorefrontError::new(
                                    &format!("$inc on '{}' needs a number", field),
                                    ErrorKind::InvalidOperation,
                                ))
                            }
                        }
                    }
                }
                other => {
                    return Err(StorefrontError::new(
                        &format!("Unknown modifier {}", other),
                        ErrorKind::InvalidOperation,
                    ))
                }
            }
        }
        Ok(UpdateSpec::Operators(operators))
    }

    /// Whether the update writes `field` itself.
    pub fn sets_field(&self, field: &str) -> bool {
        match self {
            UpdateSpec::Operators(ops) => {
                ops.set.iter().any(|(name, _)| name == field)
                    || ops.inc.iter().any(|(name, _)| name == field)
            }
            UpdateSpec::Replace(doc) => doc.contains_key(field),
        }
    }

    /// Produces the updated version of `target`.
    pub fn apply(&self, target: &Document) -> StorefrontResult<Document> {
        match self {
            UpdateSpec::Replace(replacement) => {
                let mut updated = replacement.clone();
                for kept in [DOC_ID, CREATED_AT] {
                    if !updated.contains_key(kept) {
                        if let Some(value) = target.as_map().get(kept) {
                            updated.put(kept, value.clone())?;
                        }
                    }
                }
                Ok(updated)
            }
            UpdateSpec::Operators(ops) => {
                let mut updated = target.clone();
                for (field, value) in &ops.set {
                    updated.put(field, value.clone())?;
                }
                for field in &ops.unset {
                    updated.remove(field);
                }
                for (field, amount) in &ops.inc {
                    let sum = match updated.get(field) {
                        None => Value::Number(amount.clone()),
                        Some(Value::Number(current)) => add_numbers(current, amount),
                        Some(other) => {
                            return Err(StorefrontError::new(
                                &format!("Cannot $inc '{}' holding {}", field, other),
                                ErrorKind::InvalidOperation,
                            ))
                        }
                    };
                    updated.put(field, sum)?;
                }
                Ok(updated)
            }
        }
    }
}

fn add_numbers(a: &Number, b: &Number) -> Value {
    if let (Some(x), Some(y)) = (a.as_i64(), b.as_i64()) {
        if let Some(sum) = x.checked_add(y) {
            return Value::from(sum);
        }
    }
    let sum = a.as_f64().unwrap_or(0.0) + b.as_f64().unwrap_or(0.0);
    Number::from_f64(sum).map(Value::Number).unwrap_or(Value::Null)
}

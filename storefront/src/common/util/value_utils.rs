use crate::common::FIELD_SEPARATOR;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;

/// Resolves a dot separated path (`"address.city"`, `"items.0.sku"`) inside a
/// JSON object. Numeric segments index into arrays.
pub fn lookup_path<'a>(map: &'a Map<String, Value>, path: &str) -> Option<&'a Value> {
    if let Some(value) = map.get(path) {
        return Some(value);
    }
    if !path.contains(FIELD_SEPARATOR) {
        return None;
    }

    let mut segments = path.split(FIELD_SEPARATOR);
    let first = segments.next()?;
    let mut current = map.get(first)?;
    for segment in segments {
        current = match current {
            Value::Object(inner) => inner.get(segment)?,
            Value::Array(items) => {
                let index = segment.parse::<usize>().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Numeric comparison that keeps integers exact and falls back to `f64`
/// when the representations differ.
pub fn compare_numbers(a: &Number, b: &Number) -> Ordering {
    if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
        return a.cmp(&b);
    }
    if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
        return a.cmp(&b);
    }
    let a = a.as_f64().unwrap_or(0.0);
    let b = b.as_f64().unwrap_or(0.0);
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

/// Query equality: numbers compare numerically (`1 == 1.0`), everything else
/// structurally. A missing field never equals anything, `null` included.
pub fn values_equal(field: Option<&Value>, expected: &Value) -> bool {
    match (field, expected) {
        (None, _) => false,
        (Some(Value::Number(a)), Value::Number(b)) => compare_numbers(a, b) == Ordering::Equal,
        (Some(Value::Array(a)), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| values_equal(Some(x), y))
        }
        (Some(Value::Object(a)), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter().all(|(key, x)| b.get(key).is_some_and(|y| values_equal(Some(x), y)))
        }
        (Some(actual), expected) => actual == expected,
    }
}

fn type_rank(value: Option<&Value>) -> u8 {
    match value {
        None => 0,
        Some(Value::Null) => 1,
        Some(Value::Number(_)) => 2,
        Some(Value::String(_)) => 3,
        Some(Value::Bool(_)) => 4,
        Some(Value::Array(_)) => 5,
        Some(Value::Object(_)) => 6,
    }
}

/// Default comparator used when sorting.
///
/// Order across types: missing < null < number < string < boolean < array < object.
pub fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }

    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => compare_numbers(x, y),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for (left, right) in x.iter().zip(y.iter()) {
                let ordering = compare_values(Some(left), Some(right));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Some(x @ Value::Object(_)), Some(y @ Value::Object(_))) => x.to_string().cmp(&y.to_string()),
        _ => Ordering::Equal,
    }
}

/// Hashable key for a scalar value, consistent with [values_equal]:
/// two scalars are equal exactly when their keys are equal.
/// `null`, arrays and objects are not indexable.
pub fn index_key(value: &Value) -> Option<String> {
    match value {
        Value::Bool(b) => Some(format!("b:{}", b)),
        Value::String(s) => Some(format!("s:{}", s)),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(format!("n:{}", i))
            } else if let Some(u) = n.as_u64() {
                Some(format!("n:{}", u))
            } else {
                let f = n.as_f64()?;
                if f.fract() == 0.0 && f.abs() < 9.0e15 {
                    Some(format!("n:{}", f as i64))
                } else {
                    Some(format!("n:{}", f))
                }
            }
        }
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

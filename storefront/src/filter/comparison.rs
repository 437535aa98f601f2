use crate::common::util::{compare_numbers, values_equal};
use crate::errors::{ErrorKind, StorefrontError, StorefrontResult};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

/// Comparison operators accepted inside a query condition object,
/// e.g. `{ "created_at": { "$gte": "2024-01-01" } }`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComparisonOp {
    Lt,
    Lte,
    Gt,
    Gte,
    Ne,
    In,
    Nin,
    Exists,
}

impl ComparisonOp {
    pub fn parse(token: &str) -> StorefrontResult<Self> {
        match token {
            "$lt" => Ok(ComparisonOp::Lt),
            "$lte" => Ok(ComparisonOp::Lte),
            "$gt" => Ok(ComparisonOp::Gt),
            "$gte" => Ok(ComparisonOp::Gte),
            "$ne" => Ok(ComparisonOp::Ne),
            "$in" => Ok(ComparisonOp::In),
            "$nin" => Ok(ComparisonOp::Nin),
            "$exists" => Ok(ComparisonOp::Exists),
            other => {
                log::error!("Unknown comparison operator {}", other);
                Err(StorefrontError::new(
                    &format!("Unknown comparison operator {}", other),
                    ErrorKind::FilterError,
                ))
            }
        }
    }

    /// Checks the operand shape up front so evaluation cannot fail.
    pub(crate) fn validate_operand(&self, operand: &Value) -> StorefrontResult<()> {
        let valid = match self {
            ComparisonOp::In | ComparisonOp::Nin => operand.is_array(),
            ComparisonOp::Exists => operand.is_boolean(),
            _ => true,
        };
        if valid {
            Ok(())
        } else {
            Err(StorefrontError::new(
                &format!("Invalid operand {} for {}", operand, self),
                ErrorKind::FilterError,
            ))
        }
    }

    pub fn evaluate(&self, field: Option<&Value>, operand: &Value) -> bool {
        match self {
            ComparisonOp::Lt => ordered(field, operand).is_some_and(|o| o == Ordering::Less),
            ComparisonOp::Lte => ordered(field, operand).is_some_and(|o| o != Ordering::Greater),
            ComparisonOp::Gt => ordered(field, operand).is_some_and(|o| o == Ordering::Greater),
            ComparisonOp::Gte => ordered(field, operand).is_some_and(|o| o != Ordering::Less),
            ComparisonOp::Ne => !values_equal(field, operand),
            ComparisonOp::In => operand
                .as_array()
                .is_some_and(|items| items.iter().any(|item| values_equal(field, item))),
            ComparisonOp::Nin => operand
                .as_array()
                .is_some_and(|items| !items.iter().any(|item| values_equal(field, item))),
            ComparisonOp::Exists => operand.as_bool() == Some(field.is_some()),
        }
    }
}

/// Only numbers with numbers and strings with strings are comparable.
/// ISO-8601 timestamps compare correctly as strings.
fn ordered(field: Option<&Value>, operand: &Value) -> Option<Ordering> {
    match (field?, operand) {
        (Value::Number(a), Value::Number(b)) => Some(compare_numbers(a, b)),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

impl Display for ComparisonOp {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let token = match self {
            ComparisonOp::Lt => "$lt",
            ComparisonOp::Lte => "$lte",
            ComparisonOp::Gt => "$gt",
            ComparisonOp::Gte => "$gte",
            ComparisonOp::Ne => "$ne",
            ComparisonOp::In => "$in",
            ComparisonOp::Nin => "$nin",
            ComparisonOp::Exists => "$exists",
        };
        write!(f, "{}", token)
    }
}

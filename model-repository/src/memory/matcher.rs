//! Predicate evaluation over JSON column values
//!
//! Comparisons follow SQL rather than JSON semantics: a `NULL` or missing
//! column never satisfies a comparison, numbers compare numerically (also
//! against numeric strings), and `LIKE` is case-insensitive with `%` and `_`
//! wildcards.

use std::cmp::Ordering;

use regex::Regex;
use serde_json::Value;

use crate::repository::{FilterOperator, RepositoryError, RepositoryOperation, RepositoryResult};

/// Compiled `LIKE` pattern
#[derive(Debug, Clone)]
pub(crate) struct LikePattern(Regex);

impl LikePattern {
    pub(crate) fn new(pattern: &str) -> RepositoryResult<Self> {
        let mut expression = String::with_capacity(pattern.len() + 8);
        expression.push_str("(?is)^");
        let mut literal = [0u8; 4];
        for c in pattern.chars() {
            match c {
                '%' => expression.push_str(".*"),
                '_' => expression.push('.'),
                c => expression.push_str(&regex::escape(c.encode_utf8(&mut literal))),
            }
        }
        expression.push('$');

        Regex::new(&expression).map(Self).map_err(|e| {
            RepositoryError::validation_failed(
                RepositoryOperation::ApplyCriteria,
                format!("Invalid LIKE pattern '{pattern}': {e}"),
            )
        })
    }

    pub(crate) fn matches(&self, value: &Value) -> bool {
        match value {
            Value::String(s) => self.0.is_match(s),
            Value::Number(n) => self.0.is_match(&n.to_string()),
            Value::Bool(b) => self.0.is_match(if *b { "1" } else { "0" }),
            _ => false,
        }
    }
}

/// SQL comparison of two non-null values; `None` when they are not comparable
pub(crate) fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::String(b)) => a.as_f64()?.partial_cmp(&b.trim().parse::<f64>().ok()?),
        (Value::String(a), Value::Number(b)) => a.trim().parse::<f64>().ok()?.partial_cmp(&b.as_f64()?),
        (Value::Bool(a), Value::Number(b)) => f64::from(u8::from(*a)).partial_cmp(&b.as_f64()?),
        (Value::Number(a), Value::Bool(b)) => a.as_f64()?.partial_cmp(&f64::from(u8::from(*b))),
        _ => None,
    }
}

/// Evaluate `column <operator> value`
///
/// `= NULL` and `!= NULL` behave as `IS NULL` and `IS NOT NULL`. `LIKE` and
/// `IN` are compiled separately and rejected here.
pub(crate) fn satisfies(column: Option<&Value>, operator: FilterOperator, value: &Value) -> bool {
    let column = column.filter(|v| !v.is_null());
    if value.is_null() {
        return match operator {
            FilterOperator::Equal => column.is_none(),
            FilterOperator::NotEqual => column.is_some(),
            _ => false,
        };
    }
    let Some(column) = column else {
        return false;
    };

    match operator {
        FilterOperator::Equal => compare(column, value) == Some(Ordering::Equal),
        FilterOperator::NotEqual => matches!(compare(column, value), Some(o) if o != Ordering::Equal),
        FilterOperator::GreaterThan => compare(column, value) == Some(Ordering::Greater),
        FilterOperator::GreaterThanOrEqual => {
            matches!(compare(column, value), Some(Ordering::Greater | Ordering::Equal))
        }
        FilterOperator::LessThan => compare(column, value) == Some(Ordering::Less),
        FilterOperator::LessThanOrEqual => {
            matches!(compare(column, value), Some(Ordering::Less | Ordering::Equal))
        }
        FilterOperator::Like | FilterOperator::In => false,
    }
}

/// Sort order for `ORDER BY`: `NULL` first, then by [`compare`], then by type
pub(crate) fn sort_order(left: Option<&Value>, right: Option<&Value>) -> Ordering {
    let left = left.filter(|v| !v.is_null());
    let right = right.filter(|v| !v.is_null());
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => compare(a, b).unwrap_or_else(|| type_rank(a).cmp(&type_rank(b))),
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Localized text of a column: every locale of a `{"locale": "text"}` object, or the plain value
pub(crate) fn localized_values(column: Option<&Value>) -> Vec<&Value> {
    match column {
        Some(Value::Object(locales)) => locales.values().collect(),
        Some(Value::Null) | None => Vec::new(),
        Some(other) => vec![other],
    }
}

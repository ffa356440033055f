//! Filter and ordering primitives for repository queries
//!
//! These are the building blocks accumulated by [`Criteria`](super::Criteria)
//! and handed to a [`QueryTarget`](super::QueryTarget) when a query executes.
//!
//! # Example
//!
//! ```rust
//! use model_repository::repository::{FilterCondition, FilterOperator, OrderDirection};
//!
//! let conditions = [
//!     FilterCondition::eq("status", "active"),
//!     FilterCondition::new("age", FilterOperator::GreaterThanOrEqual, 18_i64.into()),
//! ];
//! assert_eq!(conditions[1].to_string(), "age >= 18");
//!
//! let direction: OrderDirection = "desc".parse().unwrap();
//! assert_eq!(direction, OrderDirection::Descending);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Sort direction of one ordering key
///
/// # Example
///
/// ```rust
/// use model_repository::repository::OrderDirection;
///
/// assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
/// assert_eq!(format!("{}", OrderDirection::Descending), "desc");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrderDirection {
    /// Smallest first
    #[default]
    #[serde(rename = "asc")]
    Ascending,
    /// Largest first
    #[serde(rename = "desc")]
    Descending,
}

impl fmt::Display for OrderDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ascending => write!(f, "asc"),
            Self::Descending => write!(f, "desc"),
        }
    }
}

impl FromStr for OrderDirection {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "asc" | "ascending" => Ok(Self::Ascending),
            "desc" | "descending" => Ok(Self::Descending),
            other => Err(ParseFilterError::direction(other)),
        }
    }
}

/// Operator of a filter: `field <operator> value`
///
/// # Example
///
/// ```rust
/// use model_repository::repository::FilterOperator;
///
/// assert_eq!(format!("{}", FilterOperator::Equal), "=");
/// assert_eq!("like".parse::<FilterOperator>().unwrap(), FilterOperator::Like);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum FilterOperator {
    /// Equal to (=)
    #[default]
    #[serde(rename = "=")]
    Equal,
    /// Not equal to (!=)
    #[serde(rename = "!=")]
    NotEqual,
    /// Greater than (>)
    #[serde(rename = ">")]
    GreaterThan,
    /// Greater than or equal to (>=)
    #[serde(rename = ">=")]
    GreaterThanOrEqual,
    /// Less than (<)
    #[serde(rename = "<")]
    LessThan,
    /// Less than or equal to (<=)
    #[serde(rename = "<=")]
    LessThanOrEqual,
    /// Pattern matching (LIKE)
    #[serde(rename = "like")]
    Like,
    /// Set membership (IN)
    #[serde(rename = "in")]
    In,
}

impl FilterOperator {
    /// All operators accepted by [`FromStr`]
    pub const ALL: [FilterOperator; 8] = [
        Self::Equal,
        Self::NotEqual,
        Self::GreaterThan,
        Self::GreaterThanOrEqual,
        Self::LessThan,
        Self::LessThanOrEqual,
        Self::Like,
        Self::In,
    ];

    /// Canonical token for this operator (`=`, `like`, `in`, ...)
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Equal => "=",
            Self::NotEqual => "!=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::Like => "like",
            Self::In => "in",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FilterOperator {
    type Err = ParseFilterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let token = s.trim();
        if token.is_empty() {
            return Ok(Self::Equal);
        }
        match token.to_ascii_lowercase().as_str() {
            "=" | "==" => Ok(Self::Equal),
            "!=" | "<>" => Ok(Self::NotEqual),
            ">" => Ok(Self::GreaterThan),
            ">=" => Ok(Self::GreaterThanOrEqual),
            "<" => Ok(Self::LessThan),
            "<=" => Ok(Self::LessThanOrEqual),
            "like" => Ok(Self::Like),
            "in" => Ok(Self::In),
            other => Err(ParseFilterError::operator(other)),
        }
    }
}

/// Error returned when an operator or direction token is not recognised
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unrecognised {what}: '{token}'")]
pub struct ParseFilterError {
    what: &'static str,
    token: String,
}

impl ParseFilterError {
    fn operator(token: &str) -> Self {
        Self {
            what: "filter operator",
            token: token.to_string(),
        }
    }

    fn direction(token: &str) -> Self {
        Self {
            what: "order direction",
            token: token.to_string(),
        }
    }

    /// The token that failed to parse
    pub fn token(&self) -> &str {
        &self.token
    }
}

/// Right-hand side of a filter
///
/// # Example
///
/// ```rust
/// use model_repository::repository::FilterValue;
///
/// let status: FilterValue = "active".into();
/// assert_eq!(status.as_str(), Some("active"));
///
/// let team_ids: FilterValue = vec![1_i64, 2, 3].into();
/// assert!(team_ids.is_list());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// Text
    String(String),
    /// Integer
    Integer(i64),
    /// Float
    Float(f64),
    /// Boolean
    Boolean(bool),
    /// List of values (for IN operator)
    List(Vec<FilterValue>),
    /// Null value
    Null,
}

impl FilterValue {
    /// Whether this value is a list
    #[must_use]
    pub fn is_list(&self) -> bool {
        matches!(self, Self::List(_))
    }

    /// View the value as a list of members
    ///
    /// A scalar is treated as a single-member list, so `field IN scalar`
    /// behaves like equality.
    #[must_use]
    pub fn members(&self) -> Vec<&FilterValue> {
        match self {
            Self::List(values) => values.iter().collect(),
            other => vec![other],
        }
    }

    /// String content, if this is a string value
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => write!(f, "'{s}'"),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Float(n) => write!(f, "{n}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::List(values) => {
                write!(f, "(")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, ")")
            }
            Self::Null => write!(f, "NULL"),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<i32> for FilterValue {
    fn from(n: i32) -> Self {
        Self::Integer(i64::from(n))
    }
}

impl From<f64> for FilterValue {
    fn from(n: f64) -> Self {
        Self::Float(n)
    }
}

impl From<bool> for FilterValue {
    fn from(b: bool) -> Self {
        Self::Boolean(b)
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(list: Vec<T>) -> Self {
        Self::List(list.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl From<FilterValue> for serde_json::Value {
    fn from(value: FilterValue) -> Self {
        match value {
            FilterValue::String(s) => Self::String(s),
            FilterValue::Integer(n) => Self::from(n),
            FilterValue::Float(n) => serde_json::Number::from_f64(n).map_or(Self::Null, Self::Number),
            FilterValue::Boolean(b) => Self::Bool(b),
            FilterValue::List(values) => Self::Array(values.into_iter().map(Into::into).collect()),
            FilterValue::Null => Self::Null,
        }
    }
}

impl From<&FilterValue> for serde_json::Value {
    fn from(value: &FilterValue) -> Self {
        value.clone().into()
    }
}

/// A single filter condition: `field <operator> value`
///
/// # Example
///
/// ```rust
/// use model_repository::repository::{FilterCondition, FilterOperator};
///
/// let by_domain = FilterCondition::like("email", "%@example.com");
/// assert_eq!(by_domain.operator, FilterOperator::Like);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Column or attribute name
    pub field: String,
    /// How the field is compared
    pub operator: FilterOperator,
    /// Operand; a list for `in`
    pub value: FilterValue,
}

impl FilterCondition {
    /// A condition with an explicit operator
    pub fn new(field: impl Into<String>, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// `field = value`
    pub fn eq(field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// `field like pattern`, with `%` and `_` wildcards
    pub fn like(field: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Like, FilterValue::String(pattern.into()))
    }

    /// Create an IN list filter
    pub fn is_in<T: Into<FilterValue>>(field: impl Into<String>, values: Vec<T>) -> Self {
        Self::new(field, FilterOperator::In, values.into())
    }
}

impl fmt::Display for FilterCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.field, self.operator, self.value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_direction_display() {
        assert_eq!(format!("{}", OrderDirection::Ascending), "asc");
        assert_eq!(format!("{}", OrderDirection::Descending), "desc");
    }

    #[test]
    fn test_order_direction_default() {
        assert_eq!(OrderDirection::default(), OrderDirection::Ascending);
    }

    #[test]
    fn test_order_direction_parse() {
        assert_eq!("ASC".parse::<OrderDirection>().unwrap(), OrderDirection::Ascending);
        assert_eq!("desc".parse::<OrderDirection>().unwrap(), OrderDirection::Descending);
        assert_eq!("".parse::<OrderDirection>().unwrap(), OrderDirection::Ascending);

        let err = "sideways".parse::<OrderDirection>().unwrap_err();
        assert_eq!(err.token(), "sideways");
    }

    #[test]
    fn test_filter_operator_parse_roundtrips_display() {
        for operator in FilterOperator::ALL {
            assert_eq!(operator.to_string().parse::<FilterOperator>().unwrap(), operator);
        }
    }

    #[test]
    fn test_filter_operator_parse_aliases() {
        assert_eq!("LIKE".parse::<FilterOperator>().unwrap(), FilterOperator::Like);
        assert_eq!("<>".parse::<FilterOperator>().unwrap(), FilterOperator::NotEqual);
        assert_eq!("".parse::<FilterOperator>().unwrap(), FilterOperator::Equal);
        assert!("between".parse::<FilterOperator>().is_err());
    }

    #[test]
    fn test_filter_value_conversions() {
        assert_eq!(FilterValue::from("test"), FilterValue::String("test".to_string()));
        assert_eq!(FilterValue::from(42_i32), FilterValue::Integer(42));
        assert_eq!(FilterValue::from(true), FilterValue::Boolean(true));
        assert_eq!(FilterValue::from(None::<i64>), FilterValue::Null);
        assert_eq!(
            FilterValue::from(vec!["a", "b"]),
            FilterValue::List(vec!["a".into(), "b".into()])
        );
    }

    #[test]
    fn test_filter_value_members_treats_scalar_as_singleton() {
        let scalar = FilterValue::from(7_i64);
        assert_eq!(scalar.members(), vec![&FilterValue::Integer(7)]);

        let list = FilterValue::from(vec![1_i64, 2]);
        assert_eq!(list.members().len(), 2);
    }

    #[test]
    fn test_filter_value_to_json() {
        let json: serde_json::Value = FilterValue::from(vec![1_i64, 2]).into();
        assert_eq!(json, serde_json::json!([1, 2]));

        let nan: serde_json::Value = FilterValue::Float(f64::NAN).into();
        assert_eq!(nan, serde_json::Value::Null);
    }

    #[test]
    fn test_filter_condition_display() {
        let filter = FilterCondition::is_in("id", vec![1_i64, 2, 3]);
        assert_eq!(filter.to_string(), "id in (1, 2, 3)");

        let filter = FilterCondition::eq("status", "active");
        assert_eq!(filter.to_string(), "status = 'active'");
    }
}

//! Type-aware equality between a query value and a JSON node.

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde_json::{Number, Value};

use super::value::render_scalar;

/// Scalar (or null) a caller is looking for under a JSON key
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl QueryValue {
    /// Textual form used by the last-resort comparison; `Null` has none
    pub fn render(&self) -> Option<Cow<'_, str>> {
        match self {
            QueryValue::Null => None,
            QueryValue::Bool(true) => Some(Cow::Borrowed("true")),
            QueryValue::Bool(false) => Some(Cow::Borrowed("false")),
            QueryValue::Integer(i) => Some(Cow::Owned(i.to_string())),
            QueryValue::Float(f) => Some(Cow::Owned(
                Number::from_f64(*f).map_or_else(|| f.to_string(), |n| n.to_string()),
            )),
            QueryValue::Text(s) => Some(Cow::Borrowed(s.as_str())),
        }
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => write!(f, "{}", text),
            None => write!(f, "null"),
        }
    }
}

/// Reads a command-line literal: `null`, `true`/`false`, an integer, a float,
/// and anything else as text.
impl FromStr for QueryValue {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "null" => QueryValue::Null,
            "true" => QueryValue::Bool(true),
            "false" => QueryValue::Bool(false),
            _ => {
                if let Ok(i) = s.parse::<i64>() {
                    QueryValue::Integer(i)
                } else if let Some(f) = s.parse::<f64>().ok().filter(|f| f.is_finite()) {
                    QueryValue::Float(f)
                } else {
                    QueryValue::Text(s.to_string())
                }
            }
        })
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Text(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Text(value)
    }
}

impl From<bool> for QueryValue {
    fn from(value: bool) -> Self {
        QueryValue::Bool(value)
    }
}

impl From<i64> for QueryValue {
    fn from(value: i64) -> Self {
        QueryValue::Integer(value)
    }
}

impl From<i32> for QueryValue {
    fn from(value: i32) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl From<u32> for QueryValue {
    fn from(value: u32) -> Self {
        QueryValue::Integer(i64::from(value))
    }
}

impl From<f64> for QueryValue {
    fn from(value: f64) -> Self {
        QueryValue::Float(value)
    }
}

impl From<f32> for QueryValue {
    fn from(value: f32) -> Self {
        QueryValue::Float(f64::from(value))
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(QueryValue::Null, Into::into)
    }
}

/// True when `node` equals `target` under JSON's type taxonomy, falling back
/// to comparing textual renderings when the types don't pair up.
pub fn matches(node: &Value, target: &QueryValue) -> bool {
    typed_match(node, target).unwrap_or_else(|| textual_match(node, target))
}

/// Comparison for type pairings that line up; `None` when they don't
pub(crate) fn typed_match(node: &Value, target: &QueryValue) -> Option<bool> {
    match (target, node) {
        (QueryValue::Null, _) => Some(node.is_null()),
        (QueryValue::Text(expected), Value::String(actual)) => Some(actual == expected),
        (QueryValue::Integer(expected), Value::Number(actual)) => {
            Some(integral_part(actual) == Some(*expected))
        }
        (QueryValue::Float(expected), Value::Number(actual)) => {
            Some(actual.as_f64() == Some(*expected))
        }
        (QueryValue::Bool(expected), Value::Bool(actual)) => Some(actual == expected),
        _ => None,
    }
}

/// Last-resort comparison of renderings, e.g. a numeric query value against a
/// numeric string in the document
pub(crate) fn textual_match(node: &Value, target: &QueryValue) -> bool {
    match (render_scalar(node), target.render()) {
        (Some(actual), Some(expected)) => actual == expected,
        _ => false,
    }
}

// Fractional numbers compare by their truncated integral part. Numbers
// outside the i64 range have none.
fn integral_part(number: &Number) -> Option<i64> {
    if let Some(i) = number.as_i64() {
        return Some(i);
    }
    if number.is_u64() {
        return None;
    }
    let truncated = number.as_f64()?.trunc();
    // i64::MAX as f64 rounds up to 2^63, which is already out of range
    if truncated >= -(2f64.powi(63)) && truncated < 2f64.powi(63) {
        Some(truncated as i64)
    } else {
        None
    }
}

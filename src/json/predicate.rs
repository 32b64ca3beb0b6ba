use serde_json::Value;

use super::equality::QueryValue;
use super::matcher;

/// A single JSON column query, built per call
#[derive(Debug, Clone, PartialEq)]
pub enum JsonPredicate {
    /// Case-insensitive substring of any scalar; holds the lowercased needle
    ValueContains(String),
    HasKey(String),
    KeyEquals(String, QueryValue),
}

impl JsonPredicate {
    pub fn value_contains(needle: &str) -> Self {
        JsonPredicate::ValueContains(needle.to_lowercase())
    }

    pub fn has_key(key: impl Into<String>) -> Self {
        JsonPredicate::HasKey(key.into())
    }

    pub fn key_equals(key: impl Into<String>, value: QueryValue) -> Self {
        JsonPredicate::KeyEquals(key.into(), value)
    }

    pub fn name(&self) -> &'static str {
        match self {
            JsonPredicate::ValueContains(_) => "value_contains",
            JsonPredicate::HasKey(_) => "has_key",
            JsonPredicate::KeyEquals(..) => "key_equals",
        }
    }

    pub fn evaluate(&self, document: &Value) -> bool {
        match self {
            JsonPredicate::ValueContains(needle) => matcher::contains_value_folded(document, needle),
            JsonPredicate::HasKey(key) => matcher::has_key(document, key),
            JsonPredicate::KeyEquals(key, value) => matcher::has_key_with_value(document, key, value),
        }
    }

    /// Cheap test on the stored text before parsing it. Returns false only
    /// when the document cannot match; only value searches ever prune.
    ///
    /// A scalar's rendering shows up verbatim in the raw text unless the text
    /// uses escapes or the scalar is a number (`1e2` renders as `100.0`). The
    /// substring test is therefore skipped for texts with a backslash and for
    /// needles made only of characters a rendered number can contain.
    pub fn may_match_raw(&self, raw: &str) -> bool {
        match self {
            JsonPredicate::ValueContains(needle) => {
                if raw.contains('\\') || !needle.chars().any(|c| !is_number_char(c)) {
                    return true;
                }
                raw.to_lowercase().contains(needle.as_str())
            }
            JsonPredicate::HasKey(_) | JsonPredicate::KeyEquals(..) => true,
        }
    }
}

fn is_number_char(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, '.' | '-' | '+' | 'e' | 'E')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::value::parse;

    #[test]
    fn precheck_prunes_absent_words() {
        let predicate = JsonPredicate::value_contains("Goodbye");
        assert!(!predicate.may_match_raw(r#"{"greeting": "hello"}"#));
        assert!(predicate.may_match_raw(r#"{"greeting": "GOODBYE all"}"#));
    }

    #[test]
    fn precheck_never_prunes_numeric_needles() {
        let raw = r#"{"n": 1e2}"#;
        let predicate = JsonPredicate::value_contains("100");
        assert!(predicate.may_match_raw(raw));
        assert!(predicate.evaluate(&parse(raw).unwrap()));

        let dot = JsonPredicate::value_contains(".0");
        assert!(dot.may_match_raw(raw));
        assert!(dot.evaluate(&parse(raw).unwrap()));
    }

    #[test]
    fn precheck_never_prunes_escaped_text() {
        let raw = r#"{"name": "caf\u00e9"}"#;
        let predicate = JsonPredicate::value_contains("café");
        assert!(predicate.may_match_raw(raw));
        assert!(predicate.evaluate(&parse(raw).unwrap()));
    }

    #[test]
    fn precheck_only_applies_to_value_searches() {
        let raw = r#"{"a": 1}"#;
        assert!(JsonPredicate::has_key("zzz").may_match_raw(raw));
        assert!(JsonPredicate::key_equals("zzz", QueryValue::Null).may_match_raw(raw));
    }

    #[test]
    fn value_needle_is_folded_once() {
        assert_eq!(
            JsonPredicate::value_contains("HeLLo"),
            JsonPredicate::ValueContains("hello".to_string())
        );
    }
}

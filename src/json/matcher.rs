//! Recursive predicates over parsed JSON trees.
//!
//! All three walk objects and arrays depth-first and stop at the first hit.
//! Object key order carries no meaning for any of them.

use serde_json::Value;

use super::equality::{self, QueryValue};
use super::value::render_scalar;

/// True if any scalar in the tree renders to text containing `needle`.
/// Null only matches the empty needle.
pub fn contains_value(node: &Value, needle: &str, case_insensitive: bool) -> bool {
    if case_insensitive {
        contains_value_folded(node, &needle.to_lowercase())
    } else {
        contains_value_exact(node, needle)
    }
}

/// Case-insensitive search with a needle the caller already lowercased
pub(crate) fn contains_value_folded(node: &Value, needle: &str) -> bool {
    match node {
        Value::Object(map) => map.values().any(|child| contains_value_folded(child, needle)),
        Value::Array(items) => items.iter().any(|child| contains_value_folded(child, needle)),
        Value::Null => needle.is_empty(),
        scalar => render_scalar(scalar)
            .map(|text| text.to_lowercase().contains(needle))
            .unwrap_or(false),
    }
}

fn contains_value_exact(node: &Value, needle: &str) -> bool {
    match node {
        Value::Object(map) => map.values().any(|child| contains_value_exact(child, needle)),
        Value::Array(items) => items.iter().any(|child| contains_value_exact(child, needle)),
        Value::Null => needle.is_empty(),
        scalar => render_scalar(scalar)
            .map(|text| text.contains(needle))
            .unwrap_or(false),
    }
}

/// True if some object in the tree directly holds `key`.
/// Arrays hold no keys; their elements are searched.
pub fn has_key(node: &Value, key: &str) -> bool {
    match node {
        Value::Object(map) => map.contains_key(key) || map.values().any(|child| has_key(child, key)),
        Value::Array(items) => items.iter().any(|child| has_key(child, key)),
        _ => false,
    }
}

/// True if some object in the tree holds `key` with a value equal to `target`
pub fn has_key_with_value(node: &Value, key: &str, target: &QueryValue) -> bool {
    match node {
        Value::Object(map) => {
            if map.get(key).is_some_and(|value| equality::matches(value, target)) {
                return true;
            }
            map.values().any(|child| has_key_with_value(child, key, target))
        }
        Value::Array(items) => items.iter().any(|child| has_key_with_value(child, key, target)),
        _ => false,
    }
}

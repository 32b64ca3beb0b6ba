//! JSON value model for stored column payloads.
//!
//! Payloads are parsed into `serde_json::Value` trees per query and dropped
//! once matched. Nothing here caches parsed documents.

use std::borrow::Cow;

use serde_json::{Map, Value};

use super::error::ParseError;

/// Parse a complete JSON document
pub fn parse(text: &str) -> Result<Value, ParseError> {
    Ok(serde_json::from_str(text)?)
}

/// Parse the raw content of a JSON-bearing column.
///
/// Empty (or whitespace-only) content stands for the empty object.
pub fn parse_field(raw: &str) -> Result<Value, ParseError> {
    if raw.trim().is_empty() {
        return Ok(Value::Object(Map::new()));
    }
    parse(raw)
}

/// Render a value back to compact JSON text
pub fn serialize(value: &Value) -> String {
    value.to_string()
}

/// Canonical text of a scalar node: strings unquoted, numbers as serde_json
/// prints them, booleans as `true`/`false`, null as `null`.
/// Objects and arrays have no textual rendering.
pub fn render_scalar(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(true) => Some(Cow::Borrowed("true")),
        Value::Bool(false) => Some(Cow::Borrowed("false")),
        Value::Null => Some(Cow::Borrowed("null")),
        Value::Array(_) | Value::Object(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_field_is_empty_object() {
        assert_eq!(parse_field("").unwrap(), json!({}));
        assert_eq!(parse_field("   \n").unwrap(), json!({}));
    }

    #[test]
    fn malformed_text_reports_position() {
        let err = parse("{\"a\": }").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.column > 0);
        assert!(parse_field("a,b,c").is_err());
    }

    #[test]
    fn top_level_scalars_parse() {
        assert_eq!(parse("42").unwrap(), json!(42));
        assert_eq!(parse("\"x\"").unwrap(), json!("x"));
        assert_eq!(parse("null").unwrap(), Value::Null);
    }

    #[test]
    fn serialize_then_parse_is_identity() {
        let value = json!({
            "name": "sensor",
            "tags": ["a", "b", {"nested": [1, 2.5, -3]}],
            "active": true,
            "owner": null,
            "unicode": "h\u{e9}llo \"quoted\"\n"
        });
        assert_eq!(parse(&serialize(&value)).unwrap(), value);
    }

    #[test]
    fn scalar_rendering() {
        assert_eq!(render_scalar(&json!("hi")).as_deref(), Some("hi"));
        assert_eq!(render_scalar(&json!(42)).as_deref(), Some("42"));
        assert_eq!(render_scalar(&json!(2.75)).as_deref(), Some("2.75"));
        assert_eq!(render_scalar(&json!(true)).as_deref(), Some("true"));
        assert_eq!(render_scalar(&Value::Null).as_deref(), Some("null"));
        assert_eq!(render_scalar(&json!([1])), None);
        assert_eq!(render_scalar(&json!({})), None);
    }

    #[test]
    fn exponent_numbers_render_as_floats() {
        let value = parse("1e2").unwrap();
        assert_eq!(render_scalar(&value).as_deref(), Some("100.0"));
    }
}

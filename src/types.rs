//! Common types used throughout the retail lister
//!
//! This module contains shared type definitions, type aliases,
//! and small conversion helpers used across multiple modules.

use std::collections::HashMap;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Generic key-value map with string keys and values
pub type StringMap = HashMap<String, String>;

/// Caller supplied listing filters.
///
/// Keys are remote parameter names, values are scalars (strings, numbers or
/// booleans). The lister never interprets them; page sources copy them into
/// the request and overwrite only the pagination fields they own.
pub type Filters = HashMap<String, JsonValue>;

// ============================================================================
// Filter helpers
// ============================================================================

/// Render a scalar filter value the way the remote API expects it in a form body.
///
/// Strings are passed through, booleans become `1`/`0`, null becomes an
/// empty string and anything else uses its JSON text.
pub fn filter_value_to_string(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => "0".to_string(),
        JsonValue::Null => String::new(),
        JsonValue::Number(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Flatten filters into string form parameters
pub fn filters_to_params(filters: &Filters) -> StringMap {
    filters
        .iter()
        .map(|(k, v)| (k.clone(), filter_value_to_string(v)))
        .collect()
}

/// Parse a `key=value` pair into a filter entry.
///
/// Integer values are kept numeric, `true`/`false` become booleans and
/// everything else stays a string.
pub fn parse_filter(pair: &str) -> Option<(String, JsonValue)> {
    let (key, raw) = pair.split_once('=')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let raw = raw.trim();
    let value = if let Ok(n) = raw.parse::<i64>() {
        JsonValue::from(n)
    } else if raw == "true" || raw == "false" {
        JsonValue::Bool(raw == "true")
    } else {
        JsonValue::String(raw.to_string())
    };

    Some((key.to_string(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_filter_value_to_string() {
        assert_eq!(filter_value_to_string(&json!("abc")), "abc");
        assert_eq!(filter_value_to_string(&json!(42)), "42");
        assert_eq!(filter_value_to_string(&json!(1.5)), "1.5");
        assert_eq!(filter_value_to_string(&json!(true)), "1");
        assert_eq!(filter_value_to_string(&json!(false)), "0");
        assert_eq!(filter_value_to_string(&json!(null)), "");
    }

    #[test]
    fn test_filters_to_params() {
        let mut filters = Filters::new();
        filters.insert("changedSince".to_string(), json!(1_613_347_200));
        filters.insert("code".to_string(), json!("108"));

        let params = filters_to_params(&filters);
        assert_eq!(params.get("changedSince"), Some(&"1613347200".to_string()));
        assert_eq!(params.get("code"), Some(&"108".to_string()));
    }

    #[test]
    fn test_parse_filter() {
        assert_eq!(
            parse_filter("warehouseID=1"),
            Some(("warehouseID".to_string(), json!(1)))
        );
        assert_eq!(
            parse_filter("code = abc "),
            Some(("code".to_string(), json!("abc")))
        );
        assert_eq!(
            parse_filter("active=true"),
            Some(("active".to_string(), json!(true)))
        );
        assert_eq!(parse_filter("novalue"), None);
        assert_eq!(parse_filter("=1"), None);
    }
}

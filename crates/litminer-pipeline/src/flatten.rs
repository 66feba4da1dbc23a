//! Result flattening
//!
//! Model answers are nested JSON. Output rows are flat, so nested object keys
//! are joined into compound column names and arrays are rendered as a single
//! comma-separated cell.

use serde_json::{Map, Value};

/// Separator between nested keys
pub const KEY_SEPARATOR: &str = "_";

/// Key used when the input is not an object
pub const SCALAR_KEY: &str = "value";

/// Flatten with the default separator
///
/// ```
/// use litminer_pipeline::flatten;
/// use serde_json::json;
///
/// let flat = flatten(&json!({"a": 1, "b": {"c": 2, "d": [3, 4]}}));
/// assert_eq!(flat["a"], 1);
/// assert_eq!(flat["b_c"], 2);
/// assert_eq!(flat["b_d"], "3, 4");
/// ```
pub fn flatten(value: &Value) -> Map<String, Value> {
    flatten_with(value, KEY_SEPARATOR)
}

/// Flatten nested objects, joining keys with `separator`
pub fn flatten_with(value: &Value, separator: &str) -> Map<String, Value> {
    let mut out = Map::new();
    match value {
        Value::Object(map) => flatten_into(&mut out, None, map, separator),
        other => {
            out.insert(SCALAR_KEY.to_string(), leaf(other));
        }
    }
    out
}

fn flatten_into(out: &mut Map<String, Value>, prefix: Option<&str>, map: &Map<String, Value>, separator: &str) {
    for (key, value) in map {
        let name = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, separator, key),
            None => key.clone(),
        };
        match value {
            Value::Object(nested) => flatten_into(out, Some(&name), nested, separator),
            other => {
                out.insert(name, leaf(other));
            }
        }
    }
}

fn leaf(value: &Value) -> Value {
    match value {
        Value::Array(items) => Value::String(join_array(items)),
        other => other.clone(),
    }
}

fn join_array(items: &[Value]) -> String {
    items
        .iter()
        .map(|item| match item {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Render a flattened value as a CSV cell
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

//! Field accessors tolerant of the backend's mixed naming and typing.

use serde_json::{Map, Value};

pub(crate) type Object = Map<String, Value>;

/// First non-null value among `keys`.
pub(crate) fn field<'a>(obj: &'a Object, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().filter_map(|k| obj.get(*k)).find(|v| !v.is_null())
}

/// Non-empty trimmed text. Numbers and booleans are stringified.
pub(crate) fn text(obj: &Object, keys: &[&str]) -> Option<String> {
    match field(obj, keys)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Finite number, accepting numeric strings.
pub(crate) fn number(obj: &Object, keys: &[&str]) -> Option<f64> {
    let value = match field(obj, keys)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    value.is_finite().then_some(value)
}

pub(crate) fn boolean(obj: &Object, keys: &[&str]) -> Option<bool> {
    match field(obj, keys)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "1" => Some(true),
            "false" | "no" | "0" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

/// Text inside a nested object, e.g. `leaveType.name`.
pub(crate) fn nested_text(obj: &Object, outer: &[&str], keys: &[&str]) -> Option<String> {
    field(obj, outer)?.as_object().and_then(|inner| text(inner, keys))
}

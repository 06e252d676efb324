use serde::Serialize;
use serde_json::Value;

use chronik_types::{Digest, HistoryError, HistoryResult};

/// Produce the canonical encoding of a JSON-like value.
///
/// Object keys are sorted at every nesting depth, null-valued object members
/// are omitted, array order is preserved (with nulls kept in place), and the
/// output carries no insignificant whitespace.
pub fn canonical_string(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Canonical encoding as bytes, for hashing.
pub fn canonical_bytes(value: &Value) -> Vec<u8> {
    canonical_string(value).into_bytes()
}

/// Two values are canonically equal iff their canonical strings match.
pub fn canonical_equals(a: &Value, b: &Value) -> bool {
    canonical_string(a) == canonical_string(b)
}

/// SHA-256 over the canonical encoding of a value.
pub fn hash_value(value: &Value) -> Digest {
    Digest::of(&canonical_bytes(value))
}

/// Convert any serializable type into a `Value` suitable for canonical
/// encoding. Types whose serde form is already deterministic (e.g. chrono
/// timestamps as ISO-8601 strings) pass through unchanged.
pub fn to_canonical_value<T: Serialize>(value: &T) -> HistoryResult<Value> {
    serde_json::to_value(value).map_err(|e| HistoryError::Serialization(e.to_string()))
}

/// SHA-256 over the canonical encoding of any serializable value.
pub fn hash_of<T: Serialize>(value: &T) -> HistoryResult<Digest> {
    Ok(hash_value(&to_canonical_value(value)?))
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        // serde_json renders integers as plain decimal and floats in their
        // shortest round-trippable form, which is the canonical rendering.
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map
                .iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, _)| k)
                .collect();
            keys.sort_unstable();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, &map[key.as_str()]);
            }
            out.push('}');
        }
    }
}

/// JSON string escaping, matching serde_json's compact form.
fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                out.push_str(&format!("\\u{:04x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

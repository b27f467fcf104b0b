//! Canonical JSON text, the equality key for `enum` and `uniqueItems`.
//!
//! Two values are equal iff their canonical forms are byte-identical:
//! object keys sorted, no whitespace, and integer-valued numbers written in
//! integer form so `1` and `1.0` collapse to the same text.

use serde_json::Value;

use crate::value::{is_integer, number_to_f64};

/// Serialize a value to its canonical form.
pub fn canonical(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

/// Render a float for requirements and canonical text: integer form when the
/// value is integral and fits i64, shortest round-trip otherwise.
pub fn number_value(f: f64) -> Value {
    if is_integer(f) && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::from(f as i64)
    } else {
        Value::from(f)
    }
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => {
            let f = number_to_f64(n);
            if is_integer(f) && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
                out.push_str(&(f as i64).to_string());
            } else {
                // shortest round-trip form via serde_json's float writer
                out.push_str(&Value::from(f).to_string());
            }
        }
        Value::String(s) => {
            // serde_json's escaping is deterministic
            out.push_str(&Value::String(s.clone()).to_string());
        }
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
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_value(out, &map[key]);
            }
            out.push('}');
        }
    }
}

//! JSON type tags and the `type` keyword's type set.
//!
//! JSON has one numeric kind; draft-4 schemas distinguish `integer` from
//! `number`. A number carries the `integer` tag iff it is finite and has no
//! fractional part, so `2.0` validates as an integer while `2.5` does not.
//! The tag is computed from the parsed value; nothing here depends on whether
//! the parser stored it as i64, u64 or f64.

use std::fmt;

use serde_json::{Number, Value};

/// The seven draft-4 type names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum JsonType {
    Null,
    Boolean,
    Integer,
    Number,
    String,
    Array,
    Object,
}

impl JsonType {
    pub fn as_str(self) -> &'static str {
        match self {
            JsonType::Null => "null",
            JsonType::Boolean => "boolean",
            JsonType::Integer => "integer",
            JsonType::Number => "number",
            JsonType::String => "string",
            JsonType::Array => "array",
            JsonType::Object => "object",
        }
    }

    /// Parse a `type` keyword entry. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<JsonType> {
        match name {
            "null" => Some(JsonType::Null),
            "boolean" => Some(JsonType::Boolean),
            "integer" => Some(JsonType::Integer),
            "number" => Some(JsonType::Number),
            "string" => Some(JsonType::String),
            "array" => Some(JsonType::Array),
            "object" => Some(JsonType::Object),
            _ => None,
        }
    }
}

impl fmt::Display for JsonType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Tag of a parsed value. Integer-valued numbers get `Integer`.
pub fn json_type(value: &Value) -> JsonType {
    match value {
        Value::Null => JsonType::Null,
        Value::Bool(_) => JsonType::Boolean,
        Value::Number(n) => {
            if is_integer(number_to_f64(n)) {
                JsonType::Integer
            } else {
                JsonType::Number
            }
        }
        Value::String(_) => JsonType::String,
        Value::Array(_) => JsonType::Array,
        Value::Object(_) => JsonType::Object,
    }
}

/// A float counts as an integer iff it is finite with no fractional part.
pub fn is_integer(f: f64) -> bool {
    f.is_finite() && f.fract() == 0.0
}

/// Total widening of a parsed JSON number. Large u64 values round the same
/// way the original float64-based semantics did.
pub fn number_to_f64(n: &Number) -> f64 {
    if let Some(i) = n.as_i64() {
        i as f64
    } else if let Some(u) = n.as_u64() {
        u as f64
    } else {
        n.as_f64().unwrap_or(f64::NAN)
    }
}

// ------------------------------ Type set --------------------------------- //

/// The `type` keyword: either untyped (absent, matches anything) or a set of
/// tags the value must belong to. Declaration order is kept for rendering.
#[derive(Debug, Clone, Default)]
pub struct TypeSet {
    tags: Vec<JsonType>,
}

impl TypeSet {
    pub fn is_typed(&self) -> bool {
        !self.tags.is_empty()
    }

    pub fn contains(&self, tag: JsonType) -> bool {
        self.tags.contains(&tag)
    }

    /// Add a tag; `false` if it was already present.
    pub fn insert(&mut self, tag: JsonType) -> bool {
        if self.contains(tag) {
            return false;
        }
        self.tags.push(tag);
        true
    }

    /// Type gate for a value. Untyped sets accept everything; an
    /// integer-valued number passes under either `integer` or `number`,
    /// a fractional number only under `number`.
    pub fn accepts(&self, value: &Value) -> bool {
        if !self.is_typed() {
            return true;
        }
        match json_type(value) {
            JsonType::Integer => {
                self.contains(JsonType::Integer) || self.contains(JsonType::Number)
            }
            tag => self.contains(tag),
        }
    }
}

impl fmt::Display for TypeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, tag) in self.tags.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            f.write_str(tag.as_str())?;
        }
        Ok(())
    }
}

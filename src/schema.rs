//! The compiled schema tree.
//!
//! A [`Schema`] owns a flat arena of [`SchemaNode`]s; every cross-node link
//! (sub-schemas, `$ref` targets) is a [`NodeId`] into that arena, so shared
//! and recursive references need no ownership cycles. The arena is immutable
//! after compilation and a `Schema` may be shared across threads; the walker
//! only reads it.
//!
//! Keyword payloads that draft 4 overloads (`items`, `additionalItems`,
//! `additionalProperties`, `dependencies` values) each get a small enum and
//! are dispatched by case.

use regex::Regex;
use serde_json::{Map, Value};

use crate::canon::number_value;
use crate::value::TypeSet;

/// Handle to a node in a [`Schema`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeId(pub(crate) u32);

/// `items`: one schema for every element, or a positional tuple of schemas.
#[derive(Debug, Default)]
pub enum Items {
    #[default]
    None,
    Single(NodeId),
    Tuple(Vec<NodeId>),
}

/// `additionalItems` / `additionalProperties`. `true` and absence behave
/// identically, so both compile to `Any`.
#[derive(Debug, Default)]
pub enum Additional {
    #[default]
    Any,
    Forbidden,
    Node(NodeId),
}

/// A `dependencies` entry: names that must co-occur, or a schema the whole
/// object must satisfy.
#[derive(Debug)]
pub enum Dependency {
    Keys(Vec<String>),
    Node(NodeId),
}

/// One node of the compiled tree. All keyword payloads are optional; an
/// empty node accepts every value.
#[derive(Debug, Default)]
pub struct SchemaNode {
    pub(crate) types: TypeSet,

    // common
    pub(crate) enum_values: Vec<Value>,
    pub(crate) enum_canon: Vec<String>,

    // $ref: when set the node behaves purely as the target
    pub(crate) ref_target: Option<NodeId>,
    pub(crate) ref_source: Option<String>,

    // combinators
    pub(crate) all_of: Vec<NodeId>,
    pub(crate) any_of: Vec<NodeId>,
    pub(crate) one_of: Vec<NodeId>,
    pub(crate) not: Option<NodeId>,

    // number / integer
    pub(crate) multiple_of: Option<f64>,
    pub(crate) minimum: Option<f64>,
    pub(crate) exclusive_minimum: bool,
    pub(crate) maximum: Option<f64>,
    pub(crate) exclusive_maximum: bool,

    // string
    pub(crate) min_length: Option<usize>,
    pub(crate) max_length: Option<usize>,
    pub(crate) pattern: Option<Regex>,

    // array
    pub(crate) min_items: Option<usize>,
    pub(crate) max_items: Option<usize>,
    pub(crate) unique_items: bool,
    pub(crate) items: Items,
    pub(crate) additional_items: Additional,

    // object; declaration order is kept for deterministic error order
    pub(crate) min_properties: Option<usize>,
    pub(crate) max_properties: Option<usize>,
    pub(crate) required: Vec<String>,
    pub(crate) properties: Vec<(String, NodeId)>,
    pub(crate) pattern_properties: Vec<(Regex, NodeId)>,
    pub(crate) additional_properties: Additional,
    pub(crate) dependencies: Vec<(String, Dependency)>,
}

impl SchemaNode {
    pub(crate) fn has_property(&self, name: &str) -> bool {
        self.properties.iter().any(|(n, _)| n == name)
    }

    /// Quoted pattern list for `patternProperties` messages: one pattern
    /// bare, several bracketed.
    pub(crate) fn pattern_properties_string(&self) -> String {
        let quoted: Vec<String> = self
            .pattern_properties
            .iter()
            .map(|(rx, _)| format!("\"{}\"", rx.as_str()))
            .collect();
        match quoted.len() {
            1 => quoted.into_iter().next().unwrap_or_default(),
            _ => format!("[{}]", quoted.join(",")),
        }
    }
}

/// A compiled, immutable schema. Built by [`Schema::compile`].
#[derive(Debug)]
pub struct Schema {
    pub(crate) nodes: Vec<SchemaNode>,
    pub(crate) root: NodeId,
}

impl Schema {
    pub fn root(&self) -> NodeId {
        self.root
    }

    pub(crate) fn node(&self, id: NodeId) -> &SchemaNode {
        &self.nodes[id.0 as usize]
    }

    /// Condensed rendering of the whole schema (the `inspect` view).
    pub fn condensed(&self) -> Value {
        self.condense(self.root)
    }

    /// Condensed rendering of a list of alternatives, used as the
    /// requirement payload of combinator summary errors.
    pub(crate) fn condense_all(&self, ids: &[NodeId]) -> Value {
        Value::Array(ids.iter().map(|id| self.condense(*id)).collect())
    }

    /// Condensed rendering of the `patternProperties` table.
    pub(crate) fn condense_patterns(&self, node: &SchemaNode) -> Value {
        let mut map = Map::new();
        for (rx, id) in &node.pattern_properties {
            map.insert(rx.as_str().to_string(), self.condense(*id));
        }
        Value::Object(map)
    }

    /// Re-marshal a node into a compact schema-shaped JSON value. Reference
    /// nodes render as their `$ref` and stop, which keeps recursive schemas
    /// renderable.
    pub(crate) fn condense(&self, id: NodeId) -> Value {
        let node = self.node(id);
        let mut m = Map::new();

        if let Some(source) = &node.ref_source {
            m.insert("$ref".into(), Value::from(source.clone()));
            return Value::Object(m);
        }

        if node.types.is_typed() {
            m.insert("type".into(), Value::from(node.types.to_string()));
        }

        if !node.properties.is_empty() {
            let mut props = Map::new();
            for (name, child) in &node.properties {
                props.insert(name.clone(), self.condense(*child));
            }
            m.insert("properties".into(), Value::Object(props));
        }
        if !node.pattern_properties.is_empty() {
            m.insert("patternProperties".into(), self.condense_patterns(node));
        }
        if !node.required.is_empty() {
            m.insert(
                "required".into(),
                Value::Array(node.required.iter().cloned().map(Value::from).collect()),
            );
        }
        if let Some(n) = node.min_properties {
            m.insert("minProperties".into(), Value::from(n));
        }
        if let Some(n) = node.max_properties {
            m.insert("maxProperties".into(), Value::from(n));
        }
        match &node.additional_properties {
            Additional::Any => {}
            Additional::Forbidden => {
                m.insert("additionalProperties".into(), Value::Bool(false));
            }
            Additional::Node(child) => {
                m.insert("additionalProperties".into(), self.condense(*child));
            }
        }

        match &node.items {
            Items::None => {}
            Items::Single(child) => {
                m.insert("items".into(), self.condense(*child));
            }
            Items::Tuple(children) => {
                m.insert("items".into(), self.condense_all(children));
            }
        }
        match &node.additional_items {
            Additional::Any => {}
            Additional::Forbidden => {
                m.insert("additionalItems".into(), Value::Bool(false));
            }
            Additional::Node(child) => {
                m.insert("additionalItems".into(), self.condense(*child));
            }
        }
        if let Some(n) = node.min_items {
            m.insert("minItems".into(), Value::from(n));
        }
        if let Some(n) = node.max_items {
            m.insert("maxItems".into(), Value::from(n));
        }
        if node.unique_items {
            m.insert("uniqueItems".into(), Value::Bool(true));
        }

        if let Some(n) = node.min_length {
            m.insert("minLength".into(), Value::from(n));
        }
        if let Some(n) = node.max_length {
            m.insert("maxLength".into(), Value::from(n));
        }
        if let Some(rx) = &node.pattern {
            m.insert("pattern".into(), Value::from(rx.as_str()));
        }

        if let Some(f) = node.multiple_of {
            m.insert("multipleOf".into(), number_value(f));
        }
        if let Some(f) = node.minimum {
            m.insert("minimum".into(), number_value(f));
            if node.exclusive_minimum {
                m.insert("exclusiveMinimum".into(), Value::Bool(true));
            }
        }
        if let Some(f) = node.maximum {
            m.insert("maximum".into(), number_value(f));
            if node.exclusive_maximum {
                m.insert("exclusiveMaximum".into(), Value::Bool(true));
            }
        }

        if !node.enum_values.is_empty() {
            m.insert("enum".into(), Value::Array(node.enum_values.clone()));
        }

        if !node.all_of.is_empty() {
            m.insert("allOf".into(), self.condense_all(&node.all_of));
        }
        if !node.any_of.is_empty() {
            m.insert("anyOf".into(), self.condense_all(&node.any_of));
        }
        if !node.one_of.is_empty() {
            m.insert("oneOf".into(), self.condense_all(&node.one_of));
        }
        if let Some(child) = node.not {
            m.insert("not".into(), self.condense(child));
        }

        Value::Object(m)
    }
}

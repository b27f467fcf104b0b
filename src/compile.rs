//! Schema compilation: parsed JSON document in, immutable [`Schema`] out.
//!
//! Compilation is the only fallible phase. Everything the walker relies on
//! is established here: keyword payloads are type-checked, regexes compiled,
//! bound pairs ordered, `enum`/`required` entries deduplicated, and every
//! `$ref` resolved to an arena handle. A `$ref` chain that never reaches an
//! assertion node is rejected so the walker cannot loop.
//!
//! References are fragment pointers into the schema document itself (`#`,
//! `#/definitions/name`, or any `#/`-rooted pointer to a compiled schema
//! position). Remote references are a loader concern and not accepted here.

use std::collections::{HashMap, HashSet};

use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

use crate::canon::canonical;
use crate::schema::{Additional, Dependency, Items, NodeId, Schema, SchemaNode};
use crate::value::{number_to_f64, JsonType};

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("{location}: schema must be an object")]
    NotASchema { location: String },

    #[error("{location}: {keyword} must be {expected}")]
    InvalidKeyword { location: String, keyword: &'static str, expected: &'static str },

    #[error("{location}: '{name}' is not a valid type")]
    InvalidTypeName { location: String, name: String },

    #[error("{location}: {keyword} entries must be unique")]
    DuplicateEntry { location: String, keyword: &'static str },

    #[error("{location}: {lower} cannot be greater than {upper}")]
    InvertedBounds { location: String, lower: &'static str, upper: &'static str },

    #[error("{location}: {keyword} cannot be used without {requires}")]
    MissingCompanion { location: String, keyword: &'static str, requires: &'static str },

    #[error("{location}: invalid regex '{pattern}'")]
    InvalidRegex {
        location: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{location}: cannot resolve $ref '{reference}'")]
    UnresolvedRef { location: String, reference: String },

    #[error("$ref cycle through '{reference}'")]
    RefCycle { reference: String },
}

impl Schema {
    /// Compile a parsed schema document.
    pub fn compile(document: &Value) -> Result<Schema, CompileError> {
        let mut compiler = Compiler::default();
        let root = compiler.compile_node(document, "#")?;
        compiler.resolve_refs()?;
        compiler.check_ref_cycles()?;
        Ok(Schema { nodes: compiler.nodes, root })
    }
}

#[derive(Default)]
struct Compiler {
    nodes: Vec<SchemaNode>,
    by_pointer: HashMap<String, NodeId>,
    pending_refs: Vec<PendingRef>,
}

struct PendingRef {
    node: NodeId,
    reference: String,
    location: String,
}

impl Compiler {
    fn compile_node(&mut self, doc: &Value, location: &str) -> Result<NodeId, CompileError> {
        let Value::Object(map) = doc else {
            return Err(CompileError::NotASchema { location: location.to_string() });
        };

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(SchemaNode::default());
        self.by_pointer.insert(location.to_string(), id);

        // definitions are addressable by $ref even when this node is itself
        // a reference, so they compile first
        if let Some(defs) = map.get("definitions") {
            let Value::Object(defs) = defs else {
                return Err(invalid(location, "definitions", "an object of schemas"));
            };
            for (name, sub) in defs {
                let child_location = format!("{location}/definitions/{}", pointer_escape(name));
                self.compile_node(sub, &child_location)?;
            }
        }

        if let Some(reference) = map.get("$ref") {
            let Value::String(reference) = reference else {
                return Err(invalid(location, "$ref", "a string"));
            };
            let mut node = SchemaNode::default();
            node.ref_source = Some(reference.clone());
            self.pending_refs.push(PendingRef {
                node: id,
                reference: reference.clone(),
                location: location.to_string(),
            });
            self.nodes[id.0 as usize] = node;
            // a reference node behaves purely as its target; sibling
            // assertion keywords are ignored per draft 4
            return Ok(id);
        }

        let mut node = SchemaNode::default();

        self.extract_type(map, location, &mut node)?;
        self.extract_enum(map, location, &mut node)?;
        self.extract_combinators(map, location, &mut node)?;
        self.extract_number_keywords(map, location, &mut node)?;
        self.extract_string_keywords(map, location, &mut node)?;
        self.extract_array_keywords(map, location, &mut node)?;
        self.extract_object_keywords(map, location, &mut node)?;

        self.nodes[id.0 as usize] = node;
        Ok(id)
    }

    fn extract_type(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        node: &mut SchemaNode,
    ) -> Result<(), CompileError> {
        let Some(payload) = map.get("type") else { return Ok(()) };
        let names: Vec<&Value> = match payload {
            Value::String(_) => vec![payload],
            Value::Array(entries) => entries.iter().collect(),
            _ => return Err(invalid(location, "type", "a string or an array of strings")),
        };
        for entry in names {
            let Value::String(name) = entry else {
                return Err(invalid(location, "type", "a string or an array of strings"));
            };
            let tag = JsonType::from_name(name).ok_or_else(|| CompileError::InvalidTypeName {
                location: location.to_string(),
                name: name.clone(),
            })?;
            if !node.types.insert(tag) {
                return Err(CompileError::DuplicateEntry {
                    location: location.to_string(),
                    keyword: "type",
                });
            }
        }
        Ok(())
    }

    fn extract_enum(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        node: &mut SchemaNode,
    ) -> Result<(), CompileError> {
        let Some(payload) = map.get("enum") else { return Ok(()) };
        let Value::Array(entries) = payload else {
            return Err(invalid(location, "enum", "a non-empty array"));
        };
        if entries.is_empty() {
            return Err(invalid(location, "enum", "a non-empty array"));
        }
        for entry in entries {
            let canon = canonical(entry);
            if node.enum_canon.contains(&canon) {
                return Err(CompileError::DuplicateEntry {
                    location: location.to_string(),
                    keyword: "enum",
                });
            }
            node.enum_canon.push(canon);
            node.enum_values.push(entry.clone());
        }
        Ok(())
    }

    fn extract_combinators(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        node: &mut SchemaNode,
    ) -> Result<(), CompileError> {
        for (keyword, slot) in [("allOf", 0usize), ("anyOf", 1), ("oneOf", 2)] {
            let Some(payload) = map.get(keyword) else { continue };
            let Value::Array(entries) = payload else {
                return Err(invalid(location, keyword, "a non-empty array of schemas"));
            };
            if entries.is_empty() {
                return Err(invalid(location, keyword, "a non-empty array of schemas"));
            }
            let mut children = Vec::with_capacity(entries.len());
            for (i, sub) in entries.iter().enumerate() {
                let child_location = format!("{location}/{keyword}/{i}");
                children.push(self.compile_node(sub, &child_location)?);
            }
            match slot {
                0 => node.all_of = children,
                1 => node.any_of = children,
                _ => node.one_of = children,
            }
        }

        if let Some(sub) = map.get("not") {
            let child_location = format!("{location}/not");
            node.not = Some(self.compile_node(sub, &child_location)?);
        }
        Ok(())
    }

    fn extract_number_keywords(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        node: &mut SchemaNode,
    ) -> Result<(), CompileError> {
        if let Some(payload) = map.get("multipleOf") {
            let Value::Number(n) = payload else {
                return Err(invalid(location, "multipleOf", "a number strictly greater than 0"));
            };
            let f = number_to_f64(n);
            if !(f > 0.0) {
                return Err(invalid(location, "multipleOf", "a number strictly greater than 0"));
            }
            node.multiple_of = Some(f);
        }

        node.minimum = extract_number(map, location, "minimum")?;
        node.maximum = extract_number(map, location, "maximum")?;

        for (keyword, base) in [("exclusiveMinimum", "minimum"), ("exclusiveMaximum", "maximum")] {
            let Some(payload) = map.get(keyword) else { continue };
            let Value::Bool(flag) = payload else {
                return Err(invalid(location, keyword, "a boolean"));
            };
            let has_base = if base == "minimum" { node.minimum.is_some() } else { node.maximum.is_some() };
            if !has_base {
                return Err(CompileError::MissingCompanion {
                    location: location.to_string(),
                    keyword,
                    requires: base,
                });
            }
            if base == "minimum" {
                node.exclusive_minimum = *flag;
            } else {
                node.exclusive_maximum = *flag;
            }
        }
        Ok(())
    }

    fn extract_string_keywords(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        node: &mut SchemaNode,
    ) -> Result<(), CompileError> {
        node.min_length = extract_bound(map, location, "minLength")?;
        node.max_length = extract_bound(map, location, "maxLength")?;
        check_bounds(node.min_length, node.max_length, location, "minLength", "maxLength")?;

        if let Some(payload) = map.get("pattern") {
            let Value::String(pattern) = payload else {
                return Err(invalid(location, "pattern", "a string containing a valid regex"));
            };
            node.pattern = Some(compile_regex(pattern, location)?);
        }
        Ok(())
    }

    fn extract_array_keywords(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        node: &mut SchemaNode,
    ) -> Result<(), CompileError> {
        node.min_items = extract_bound(map, location, "minItems")?;
        node.max_items = extract_bound(map, location, "maxItems")?;
        check_bounds(node.min_items, node.max_items, location, "minItems", "maxItems")?;

        if let Some(payload) = map.get("uniqueItems") {
            let Value::Bool(flag) = payload else {
                return Err(invalid(location, "uniqueItems", "a boolean"));
            };
            node.unique_items = *flag;
        }

        if let Some(payload) = map.get("items") {
            node.items = match payload {
                Value::Object(_) => {
                    let child_location = format!("{location}/items");
                    Items::Single(self.compile_node(payload, &child_location)?)
                }
                Value::Array(entries) => {
                    let mut children = Vec::with_capacity(entries.len());
                    for (i, sub) in entries.iter().enumerate() {
                        let child_location = format!("{location}/items/{i}");
                        children.push(self.compile_node(sub, &child_location)?);
                    }
                    Items::Tuple(children)
                }
                _ => return Err(invalid(location, "items", "a schema or an array of schemas")),
            };
        }

        if let Some(payload) = map.get("additionalItems") {
            let child_location = format!("{location}/additionalItems");
            node.additional_items =
                self.extract_additional(payload, &child_location, "additionalItems")?;
        }
        Ok(())
    }

    fn extract_object_keywords(
        &mut self,
        map: &Map<String, Value>,
        location: &str,
        node: &mut SchemaNode,
    ) -> Result<(), CompileError> {
        node.min_properties = extract_bound(map, location, "minProperties")?;
        node.max_properties = extract_bound(map, location, "maxProperties")?;
        check_bounds(
            node.min_properties,
            node.max_properties,
            location,
            "minProperties",
            "maxProperties",
        )?;

        if let Some(payload) = map.get("required") {
            let Value::Array(entries) = payload else {
                return Err(invalid(location, "required", "an array of unique strings"));
            };
            for entry in entries {
                let Value::String(name) = entry else {
                    return Err(invalid(location, "required", "an array of unique strings"));
                };
                if node.required.contains(name) {
                    return Err(CompileError::DuplicateEntry {
                        location: location.to_string(),
                        keyword: "required",
                    });
                }
                node.required.push(name.clone());
            }
        }

        if let Some(payload) = map.get("properties") {
            let Value::Object(props) = payload else {
                return Err(invalid(location, "properties", "an object of schemas"));
            };
            for (name, sub) in props {
                let child_location = format!("{location}/properties/{}", pointer_escape(name));
                let child = self.compile_node(sub, &child_location)?;
                node.properties.push((name.clone(), child));
            }
        }

        if let Some(payload) = map.get("patternProperties") {
            let Value::Object(props) = payload else {
                return Err(invalid(location, "patternProperties", "an object of schemas"));
            };
            for (pattern, sub) in props {
                let regex = compile_regex(pattern, location)?;
                let child_location =
                    format!("{location}/patternProperties/{}", pointer_escape(pattern));
                let child = self.compile_node(sub, &child_location)?;
                node.pattern_properties.push((regex, child));
            }
        }

        if let Some(payload) = map.get("additionalProperties") {
            let child_location = format!("{location}/additionalProperties");
            node.additional_properties =
                self.extract_additional(payload, &child_location, "additionalProperties")?;
        }

        if let Some(payload) = map.get("dependencies") {
            let Value::Object(deps) = payload else {
                return Err(invalid(location, "dependencies", "an object"));
            };
            for (name, dep) in deps {
                let dependency = match dep {
                    Value::Array(entries) => {
                        let mut keys = Vec::with_capacity(entries.len());
                        for entry in entries {
                            let Value::String(key) = entry else {
                                return Err(invalid(
                                    location,
                                    "dependencies",
                                    "arrays of property names or schemas",
                                ));
                            };
                            keys.push(key.clone());
                        }
                        Dependency::Keys(keys)
                    }
                    Value::Object(_) => {
                        let child_location =
                            format!("{location}/dependencies/{}", pointer_escape(name));
                        Dependency::Node(self.compile_node(dep, &child_location)?)
                    }
                    _ => {
                        return Err(invalid(
                            location,
                            "dependencies",
                            "arrays of property names or schemas",
                        ))
                    }
                };
                node.dependencies.push((name.clone(), dependency));
            }
        }
        Ok(())
    }

    fn extract_additional(
        &mut self,
        payload: &Value,
        child_location: &str,
        keyword: &'static str,
    ) -> Result<Additional, CompileError> {
        match payload {
            Value::Bool(true) => Ok(Additional::Any),
            Value::Bool(false) => Ok(Additional::Forbidden),
            Value::Object(_) => Ok(Additional::Node(self.compile_node(payload, child_location)?)),
            _ => Err(invalid(child_location, keyword, "a boolean or a schema")),
        }
    }

    fn resolve_refs(&mut self) -> Result<(), CompileError> {
        for pending in std::mem::take(&mut self.pending_refs) {
            let target = self.by_pointer.get(pending.reference.as_str()).copied().ok_or(
                CompileError::UnresolvedRef {
                    location: pending.location,
                    reference: pending.reference.clone(),
                },
            )?;
            self.nodes[pending.node.0 as usize].ref_target = Some(target);
        }
        Ok(())
    }

    /// Reject reference chains that never reach an assertion node. The
    /// walker follows `ref_target` hops unconditionally; this pass is what
    /// bounds them.
    fn check_ref_cycles(&self) -> Result<(), CompileError> {
        for (index, node) in self.nodes.iter().enumerate() {
            if node.ref_target.is_none() {
                continue;
            }
            let mut seen = HashSet::new();
            seen.insert(index);
            let mut cursor = node;
            while let Some(target) = cursor.ref_target {
                if !seen.insert(target.0 as usize) {
                    return Err(CompileError::RefCycle {
                        reference: node.ref_source.clone().unwrap_or_default(),
                    });
                }
                cursor = &self.nodes[target.0 as usize];
            }
        }
        Ok(())
    }
}

fn invalid(location: &str, keyword: &'static str, expected: &'static str) -> CompileError {
    CompileError::InvalidKeyword { location: location.to_string(), keyword, expected }
}

fn extract_number(
    map: &Map<String, Value>,
    location: &str,
    keyword: &'static str,
) -> Result<Option<f64>, CompileError> {
    let Some(payload) = map.get(keyword) else { return Ok(None) };
    let Value::Number(n) = payload else {
        return Err(invalid(location, keyword, "a number"));
    };
    Ok(Some(number_to_f64(n)))
}

fn extract_bound(
    map: &Map<String, Value>,
    location: &str,
    keyword: &'static str,
) -> Result<Option<usize>, CompileError> {
    let Some(payload) = map.get(keyword) else { return Ok(None) };
    let bound = payload
        .as_u64()
        .ok_or_else(|| invalid(location, keyword, "a non-negative integer"))?;
    Ok(Some(bound as usize))
}

fn check_bounds(
    min: Option<usize>,
    max: Option<usize>,
    location: &str,
    lower: &'static str,
    upper: &'static str,
) -> Result<(), CompileError> {
    if let (Some(min), Some(max)) = (min, max) {
        if min > max {
            return Err(CompileError::InvertedBounds {
                location: location.to_string(),
                lower,
                upper,
            });
        }
    }
    Ok(())
}

fn compile_regex(pattern: &str, location: &str) -> Result<Regex, CompileError> {
    Regex::new(pattern).map_err(|source| CompileError::InvalidRegex {
        location: location.to_string(),
        pattern: pattern.to_string(),
        source,
    })
}

/// JSON-pointer segment escaping: `~` then `/`.
fn pointer_escape(segment: &str) -> String {
    segment.replace('~', "~0").replace('/', "~1")
}

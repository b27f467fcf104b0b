//! The recursive validation walker.
//!
//! Walks the schema tree and the document in lockstep. Per node the order
//! is fixed: dereference `$ref`, type-gate, applicators (combinators and
//! `dependencies`), `enum`, then the assertions for the value's own type,
//! and for objects a final descent into declared properties. Nothing here
//! fails; every violation lands in the [`Report`] and the walk continues,
//! so one value can accrue several errors.
//!
//! Combinator alternatives each get a fresh sub-report. Whether a
//! sub-report's errors reach the caller depends on the combinator: `allOf`
//! merges everything, `anyOf`/`oneOf` merge only the best-scoring failure,
//! `not` discards.

pub mod array;
pub mod number;
pub mod object;
pub mod string;

use std::rc::Rc;

use serde_json::Value;
use tracing::trace;

use crate::context::JsonContext;
use crate::report::{best_result, Keyword, Report};
use crate::schema::{Dependency, NodeId, Schema, SchemaNode};
use crate::value::number_to_f64;

/// Validate a document against a compiled schema.
pub fn validate(schema: &Schema, document: &Value) -> Report {
    let mut result = Report::default();
    let context = JsonContext::root();
    walk(schema, schema.root(), document, &mut result, &context);
    result
}

/// Validate against a sub-schema with a fresh report.
pub(crate) fn sub_validate(
    schema: &Schema,
    id: NodeId,
    value: &Value,
    context: &Rc<JsonContext>,
) -> Report {
    let mut result = Report::default();
    walk(schema, id, value, &mut result, context);
    result
}

pub(crate) fn walk(
    schema: &Schema,
    id: NodeId,
    value: &Value,
    result: &mut Report,
    context: &Rc<JsonContext>,
) {
    let mut node = schema.node(id);
    // a reference node behaves purely as its target; compilation rejected
    // unterminated chains
    while let Some(target) = node.ref_target {
        node = schema.node(target);
    }

    trace!(location = %context, "validate");

    if node.types.is_typed() && !node.types.accepts(value) {
        let types = node.types.to_string();
        result.add_error(
            Rc::clone(context),
            Keyword::Type,
            Some(Value::from(types.clone())),
            value.clone(),
            format!("must be of type {types}"),
        );
        return;
    }

    validate_applicators(schema, node, value, result, context);
    validate_common(node, value, result, context);

    match value {
        Value::Array(items) => {
            array::validate(schema, node, items, value, result, context);
        }
        Value::Object(map) => {
            object::validate(schema, node, map, value, result, context);
            for (name, child) in &node.properties {
                if let Some(next) = map.get(name) {
                    let sub_context = JsonContext::child(context, name.clone());
                    walk(schema, *child, next, result, &sub_context);
                }
            }
        }
        Value::String(s) => string::validate(node, s, value, result, context),
        Value::Number(n) => number::validate(node, number_to_f64(n), value, result, context),
        Value::Null | Value::Bool(_) => {}
    }

    result.increment_score();
}

// --------------------------- Applicators --------------------------------- //

fn validate_applicators(
    schema: &Schema,
    node: &SchemaNode,
    value: &Value,
    result: &mut Report,
    context: &Rc<JsonContext>,
) {
    if !node.any_of.is_empty() {
        let mut validated = false;
        let mut attempts = Vec::new();
        for child in &node.any_of {
            if validated {
                break;
            }
            let attempt = sub_validate(schema, *child, value, context);
            validated = attempt.valid();
            attempts.push(attempt);
        }
        if !validated {
            if let Some(best) = best_result(attempts) {
                // the closest-matching alternative is probably the one the
                // document was aiming for
                result.merge(best);
            } else {
                result.add_error(
                    Rc::clone(context),
                    Keyword::AnyOf,
                    Some(schema.condense_all(&node.any_of)),
                    value.clone(),
                    "must match at least one of the schemas".to_string(),
                );
            }
        }
    }

    if !node.one_of.is_empty() {
        let mut validated = 0usize;
        let mut failures = Vec::new();
        for child in &node.one_of {
            let attempt = sub_validate(schema, *child, value, context);
            if attempt.valid() {
                validated += 1;
            } else {
                failures.push(attempt);
            }
        }
        if validated != 1 {
            let best = if validated == 0 { best_result(failures) } else { None };
            if let Some(best) = best {
                result.merge(best);
            } else {
                result.add_error(
                    Rc::clone(context),
                    Keyword::OneOf,
                    Some(schema.condense_all(&node.one_of)),
                    value.clone(),
                    "must match exactly one of the schemas".to_string(),
                );
            }
        }
    }

    if !node.all_of.is_empty() {
        let mut validated = 0usize;
        for child in &node.all_of {
            let attempt = sub_validate(schema, *child, value, context);
            if attempt.valid() {
                validated += 1;
            }
            result.merge(attempt);
        }
        if validated != node.all_of.len() {
            result.add_error(
                Rc::clone(context),
                Keyword::AllOf,
                Some(schema.condense_all(&node.all_of)),
                value.clone(),
                "must match all of the schemas".to_string(),
            );
        }
    }

    if let Some(child) = node.not {
        let attempt = sub_validate(schema, child, value, context);
        if attempt.valid() {
            result.add_error(
                Rc::clone(context),
                Keyword::Not,
                Some(schema.condense(child)),
                value.clone(),
                "must not match the schema".to_string(),
            );
        }
        // sub-errors of a failed `not` are what we wanted; drop them
    }

    if !node.dependencies.is_empty() {
        if let Value::Object(map) = value {
            for key in map.keys() {
                let Some((_, dependency)) = node.dependencies.iter().find(|(name, _)| name == key)
                else {
                    continue;
                };
                match dependency {
                    Dependency::Keys(names) => {
                        for name in names {
                            if !map.contains_key(name) {
                                result.add_error(
                                    JsonContext::child(context, key.clone()),
                                    Keyword::Dependencies,
                                    Some(Value::Array(
                                        names.iter().cloned().map(Value::from).collect(),
                                    )),
                                    value.clone(),
                                    format!("has a dependency on '{name}'"),
                                );
                            }
                        }
                    }
                    // the whole object is re-validated under the parent
                    // context, errors merged directly
                    Dependency::Node(child) => walk(schema, *child, value, result, context),
                }
            }
        }
    }

    result.increment_score();
}

// ------------------------------ Common ----------------------------------- //

fn validate_common(node: &SchemaNode, value: &Value, result: &mut Report, context: &Rc<JsonContext>) {
    if !node.enum_canon.is_empty() {
        let canon = crate::canon::canonical(value);
        if !node.enum_canon.iter().any(|entry| *entry == canon) {
            result.add_error(
                Rc::clone(context),
                Keyword::Enum,
                Some(Value::Array(node.enum_values.clone())),
                value.clone(),
                "must match one of the enum values".to_string(),
            );
        }
    }

    result.increment_score();
}

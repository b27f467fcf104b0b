//! Object assertions: property bounds, `required`, property-name coverage
//! through `properties` × `patternProperties` × `additionalProperties`.
//!
//! Coverage follows the draft-4 reading: a key is accounted for by being
//! declared under `properties`, or by every matching pattern schema
//! accepting its value. `additionalProperties` only speaks for keys left
//! over, as a verdict (`false`), a schema, or silence.

use std::rc::Rc;

use serde_json::{Map, Value};

use crate::context::JsonContext;
use crate::report::{Keyword, Report};
use crate::schema::{Additional, Schema, SchemaNode};
use crate::validate::sub_validate;

pub(crate) fn validate(
    schema: &Schema,
    node: &SchemaNode,
    map: &Map<String, Value>,
    value: &Value,
    result: &mut Report,
    context: &Rc<JsonContext>,
) {
    if let Some(min) = node.min_properties {
        if map.len() < min {
            result.add_error(
                Rc::clone(context),
                Keyword::MinProperties,
                Some(Value::from(min)),
                value.clone(),
                format!("object must have at least {min} properties"),
            );
        }
    }
    if let Some(max) = node.max_properties {
        if map.len() > max {
            result.add_error(
                Rc::clone(context),
                Keyword::MaxProperties,
                Some(Value::from(max)),
                value.clone(),
                format!("object must have at most {max} properties"),
            );
        }
    }

    for name in &node.required {
        if map.contains_key(name) {
            result.increment_score();
        } else {
            result.add_error(
                JsonContext::child(context, name.clone()),
                Keyword::Required,
                None,
                Value::Null,
                "is required".to_string(),
            );
        }
    }

    match &node.additional_properties {
        Additional::Forbidden => {
            for (key, entry) in map {
                let declared = node.has_property(key);
                let (has, matched) = validate_pattern_property(schema, node, key, entry, result, context);
                if declared {
                    if has && !matched {
                        result.add_error(
                            JsonContext::child(context, key.clone()),
                            Keyword::AdditionalProperties,
                            Some(schema.condense_patterns(node)),
                            Value::Null,
                            format!("additional property '{key}' is not allowed"),
                        );
                    }
                } else if !has || !matched {
                    result.add_error(
                        JsonContext::child(context, key.clone()),
                        Keyword::AdditionalProperties,
                        None,
                        Value::Null,
                        format!("additional property '{key}' is not allowed"),
                    );
                }
            }
        }
        Additional::Node(child) => {
            for (key, entry) in map {
                let declared = node.has_property(key);
                let (has, matched) = validate_pattern_property(schema, node, key, entry, result, context);
                let fallthrough = if declared { has && !matched } else { !has || !matched };
                if fallthrough {
                    // the additionalProperties schema sees the value under
                    // the parent context
                    let attempt = sub_validate(schema, *child, entry, context);
                    result.merge(attempt);
                }
            }
        }
        Additional::Any => {
            for (key, entry) in map {
                let (has, matched) = validate_pattern_property(schema, node, key, entry, result, context);
                if has && !matched {
                    result.add_error(
                        JsonContext::child(context, key.clone()),
                        Keyword::PatternProperties,
                        Some(schema.condense_patterns(node)),
                        value.clone(),
                        format!("does not match any pattern of {}", node.pattern_properties_string()),
                    );
                }
            }
        }
    }

    result.increment_score();
}

/// Run every matching pattern schema against one property value.
///
/// Returns `(has, matched)`: whether any pattern applied, and whether all
/// that applied accepted the value. Sub-errors are merged either way; a
/// fully matched key earns a score point.
fn validate_pattern_property(
    schema: &Schema,
    node: &SchemaNode,
    key: &str,
    entry: &Value,
    result: &mut Report,
    context: &Rc<JsonContext>,
) -> (bool, bool) {
    let mut has = false;
    let mut all_valid = true;

    for (regex, child) in &node.pattern_properties {
        if regex.is_match(key) {
            has = true;
            let sub_context = JsonContext::child(context, key.to_string());
            let attempt = sub_validate(schema, *child, entry, &sub_context);
            if !attempt.valid() {
                all_valid = false;
            }
            result.merge(attempt);
        }
    }

    if !has || !all_valid {
        return (has, false);
    }

    result.increment_score();
    (true, true)
}

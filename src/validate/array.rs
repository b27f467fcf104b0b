//! Array assertions: `items`, `additionalItems`, size bounds, `uniqueItems`.

use std::rc::Rc;

use serde_json::Value;

use crate::canon::canonical;
use crate::context::JsonContext;
use crate::report::{Keyword, Report};
use crate::schema::{Additional, Items, Schema, SchemaNode};
use crate::validate::sub_validate;

pub(crate) fn validate(
    schema: &Schema,
    node: &SchemaNode,
    items: &[Value],
    value: &Value,
    result: &mut Report,
    context: &Rc<JsonContext>,
) {
    match &node.items {
        Items::None => {}
        Items::Single(child) => {
            for (i, element) in items.iter().enumerate() {
                let sub_context = JsonContext::child(context, i.to_string());
                let attempt = sub_validate(schema, *child, element, &sub_context);
                result.merge(attempt);
            }
        }
        Items::Tuple(children) => {
            let positional = children.len().min(items.len());
            for i in 0..positional {
                let sub_context = JsonContext::child(context, i.to_string());
                let attempt = sub_validate(schema, children[i], &items[i], &sub_context);
                result.merge(attempt);
            }
            // elements past the tuple answer to additionalItems; a value
            // shorter than the tuple is only the size bounds' business
            for i in children.len()..items.len() {
                match &node.additional_items {
                    Additional::Any => {}
                    Additional::Forbidden => {
                        result.add_error(
                            Rc::clone(context),
                            Keyword::AdditionalItems,
                            Some(Value::Bool(false)),
                            value.clone(),
                            "additional items are not allowed".to_string(),
                        );
                    }
                    Additional::Node(child) => {
                        let sub_context = JsonContext::child(context, i.to_string());
                        let attempt = sub_validate(schema, *child, &items[i], &sub_context);
                        result.merge(attempt);
                    }
                }
            }
        }
    }

    if let Some(min) = node.min_items {
        if items.len() < min {
            result.add_error(
                Rc::clone(context),
                Keyword::MinItems,
                Some(Value::from(min)),
                value.clone(),
                format!("array must have at least {min} items"),
            );
        }
    }
    if let Some(max) = node.max_items {
        if items.len() > max {
            result.add_error(
                Rc::clone(context),
                Keyword::MaxItems,
                Some(Value::from(max)),
                value.clone(),
                format!("array must have at most {max} items"),
            );
        }
    }

    if node.unique_items {
        let mut seen = Vec::with_capacity(items.len());
        for element in items {
            let canon = canonical(element);
            if seen.contains(&canon) {
                result.add_error(
                    Rc::clone(context),
                    Keyword::UniqueItems,
                    None,
                    value.clone(),
                    "array items must be unique".to_string(),
                );
            }
            seen.push(canon);
        }
    }

    result.increment_score();
}

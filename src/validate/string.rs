//! String assertions. Lengths count Unicode code points; `pattern` is a
//! partial match, per the usual JSON Schema reading.

use std::rc::Rc;

use serde_json::Value;

use crate::context::JsonContext;
use crate::report::{Keyword, Report};
use crate::schema::SchemaNode;

pub(crate) fn validate(
    node: &SchemaNode,
    s: &str,
    value: &Value,
    result: &mut Report,
    context: &Rc<JsonContext>,
) {
    if node.min_length.is_some() || node.max_length.is_some() {
        let length = s.chars().count();
        if let Some(min) = node.min_length {
            if length < min {
                result.add_error(
                    Rc::clone(context),
                    Keyword::MinLength,
                    Some(Value::from(min)),
                    value.clone(),
                    format!("string length must be greater than or equal to {min}"),
                );
            }
        }
        if let Some(max) = node.max_length {
            if length > max {
                result.add_error(
                    Rc::clone(context),
                    Keyword::MaxLength,
                    Some(Value::from(max)),
                    value.clone(),
                    format!("string length must be less than or equal to {max}"),
                );
            }
        }
    }

    if let Some(regex) = &node.pattern {
        if !regex.is_match(s) {
            result.add_error(
                Rc::clone(context),
                Keyword::Pattern,
                Some(Value::from(regex.as_str())),
                value.clone(),
                format!("does not match pattern '{}'", regex.as_str()),
            );
        }
    }

    result.increment_score();
}

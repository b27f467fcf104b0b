//! Numeric assertions: `multipleOf`, `minimum`/`maximum` with their
//! exclusive flags. Runs for every numeric value, integer-tagged or not.

use std::rc::Rc;

use serde_json::Value;

use crate::canon::number_value;
use crate::context::JsonContext;
use crate::report::{Keyword, Report};
use crate::schema::SchemaNode;
use crate::value::is_integer;

pub(crate) fn validate(
    node: &SchemaNode,
    n: f64,
    value: &Value,
    result: &mut Report,
    context: &Rc<JsonContext>,
) {
    if let Some(factor) = node.multiple_of {
        if !is_integer(n / factor) {
            result.add_error(
                Rc::clone(context),
                Keyword::MultipleOf,
                Some(number_value(factor)),
                value.clone(),
                format!("must be a multiple of {}", number_value(factor)),
            );
        }
    }

    if let Some(maximum) = node.maximum {
        if node.exclusive_maximum {
            if n >= maximum {
                result.add_error(
                    Rc::clone(context),
                    Keyword::ExclusiveMaximum,
                    Some(number_value(maximum)),
                    value.clone(),
                    format!("must be strictly less than {}", number_value(maximum)),
                );
            }
        } else if n > maximum {
            result.add_error(
                Rc::clone(context),
                Keyword::Maximum,
                Some(number_value(maximum)),
                value.clone(),
                format!("must be less than or equal to {}", number_value(maximum)),
            );
        }
    }

    if let Some(minimum) = node.minimum {
        if node.exclusive_minimum {
            if n <= minimum {
                result.add_error(
                    Rc::clone(context),
                    Keyword::ExclusiveMinimum,
                    Some(number_value(minimum)),
                    value.clone(),
                    format!("must be strictly greater than {}", number_value(minimum)),
                );
            }
        } else if n < minimum {
            result.add_error(
                Rc::clone(context),
                Keyword::Minimum,
                Some(number_value(minimum)),
                value.clone(),
                format!("must be greater than or equal to {}", number_value(minimum)),
            );
        }
    }

    result.increment_score();
}

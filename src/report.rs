//! Validation outcome: error accumulation, scoring, best-match selection.
//!
//! Failures are data, never panics or `Err`s. Each assertion routine bumps
//! the score by one when it runs to completion and every recorded error
//! subtracts two, so a completed-but-failed routine nets minus one. The score
//! only matters when a combinator has to pick the closest-matching
//! alternative to report.

use std::fmt;
use std::rc::Rc;

use serde_json::{Map, Value};

use crate::context::JsonContext;

/// Every keyword that can label an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Type,
    Enum,
    MultipleOf,
    Minimum,
    Maximum,
    ExclusiveMinimum,
    ExclusiveMaximum,
    MinLength,
    MaxLength,
    Pattern,
    MinItems,
    MaxItems,
    UniqueItems,
    AdditionalItems,
    MinProperties,
    MaxProperties,
    Required,
    AdditionalProperties,
    PatternProperties,
    Dependencies,
    AllOf,
    AnyOf,
    OneOf,
    Not,
    /// Failures of the validator itself, not of the document. The current
    /// canonicalizer is total, so nothing in this crate emits it, but hosts
    /// observing a report must still expect the category.
    Internal,
}

impl Keyword {
    pub fn as_str(self) -> &'static str {
        match self {
            Keyword::Type => "type",
            Keyword::Enum => "enum",
            Keyword::MultipleOf => "multipleOf",
            Keyword::Minimum => "minimum",
            Keyword::Maximum => "maximum",
            Keyword::ExclusiveMinimum => "exclusiveMinimum",
            Keyword::ExclusiveMaximum => "exclusiveMaximum",
            Keyword::MinLength => "minLength",
            Keyword::MaxLength => "maxLength",
            Keyword::Pattern => "pattern",
            Keyword::MinItems => "minItems",
            Keyword::MaxItems => "maxItems",
            Keyword::UniqueItems => "uniqueItems",
            Keyword::AdditionalItems => "additionalItems",
            Keyword::MinProperties => "minProperties",
            Keyword::MaxProperties => "maxProperties",
            Keyword::Required => "required",
            Keyword::AdditionalProperties => "additionalProperties",
            Keyword::PatternProperties => "patternProperties",
            Keyword::Dependencies => "dependencies",
            Keyword::AllOf => "allOf",
            Keyword::AnyOf => "anyOf",
            Keyword::OneOf => "oneOf",
            Keyword::Not => "not",
            Keyword::Internal => "internal",
        }
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded failure.
#[derive(Debug, Clone)]
pub struct ValidationError {
    /// Where in the document the check failed.
    pub context: Rc<JsonContext>,
    /// The keyword responsible.
    pub keyword: Keyword,
    /// The keyword's requirement, when one is meaningful to show.
    pub requirement: Option<Value>,
    /// The offending document value.
    pub value: Value,
    /// Human-readable description.
    pub message: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.context, self.message)
    }
}

/// Accumulated outcome of one validation call chain.
#[derive(Debug, Default)]
pub struct Report {
    errors: Vec<ValidationError>,
    score: i32,
}

impl Report {
    pub fn valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub(crate) fn score(&self) -> i32 {
        self.score
    }

    pub(crate) fn add_error(
        &mut self,
        context: Rc<JsonContext>,
        keyword: Keyword,
        requirement: Option<Value>,
        value: Value,
        message: String,
    ) {
        self.errors.push(ValidationError { context, keyword, requirement, value, message });
        // nets -1 against the +1 the completing routine adds for itself
        self.score -= 2;
    }

    /// Fold a sub-validation into this one: errors and score both carry over.
    pub(crate) fn merge(&mut self, other: Report) {
        self.errors.extend(other.errors);
        self.score += other.score;
    }

    pub(crate) fn increment_score(&mut self) {
        self.score += 1;
    }

    /// Serialized error map: `{ location: [[keyword, requirement?], ...] }`.
    /// Locations appear in first-error order; within a location, errors keep
    /// their recording order.
    pub fn to_json(&self) -> Value {
        let mut map = Map::new();
        for error in &self.errors {
            let mut tuple = vec![Value::from(error.keyword.as_str())];
            if let Some(requirement) = &error.requirement {
                tuple.push(requirement.clone());
            }
            let entries = map
                .entry(error.context.to_string())
                .or_insert_with(|| Value::Array(Vec::new()));
            if let Value::Array(entries) = entries {
                entries.push(Value::Array(tuple));
            }
        }
        Value::Object(map)
    }
}

/// Pick the sub-result with the strictly highest score. A lone candidate is
/// trivially best; a tie at the top means no alternative stands out and the
/// caller falls back to a summary error.
pub(crate) fn best_result(results: Vec<Report>) -> Option<Report> {
    let mut results = results;
    match results.len() {
        0 => None,
        1 => results.pop(),
        _ => {
            results.sort_by(|a, b| b.score.cmp(&a.score));
            if results[0].score != results[1].score {
                results.truncate(1);
                results.pop()
            } else {
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report_with(score: i32, errors: usize) -> Report {
        let mut r = Report::default();
        for _ in 0..errors {
            r.add_error(
                JsonContext::root(),
                Keyword::Type,
                Some(json!("string")),
                json!(1),
                "must be of type string".into(),
            );
        }
        r.score = score;
        r
    }

    #[test]
    fn valid_iff_no_errors() {
        assert!(Report::default().valid());
        assert!(!report_with(0, 1).valid());
    }

    #[test]
    fn error_scoring_nets_minus_one_per_error() {
        let mut r = Report::default();
        r.increment_score();
        assert_eq!(r.score(), 1);
        r.add_error(JsonContext::root(), Keyword::Enum, None, json!(1), "no match".into());
        assert_eq!(r.score(), -1);
    }

    #[test]
    fn merge_carries_errors_and_score() {
        let mut outer = Report::default();
        outer.increment_score();
        outer.merge(report_with(3, 1));
        assert_eq!(outer.score(), 4);
        assert_eq!(outer.errors().len(), 1);
    }

    #[test]
    fn best_result_requires_a_strict_winner() {
        assert!(best_result(vec![]).is_none());
        assert!(best_result(vec![report_with(-3, 1)]).is_some());
        assert!(best_result(vec![report_with(2, 1), report_with(2, 1)]).is_none());
        let best = best_result(vec![report_with(5, 1), report_with(2, 1)]).unwrap();
        assert_eq!(best.score(), 5);
    }

    #[test]
    fn serialized_tuples_omit_absent_requirements() {
        let mut r = Report::default();
        r.add_error(JsonContext::root(), Keyword::UniqueItems, None, json!([1, 1]), "dup".into());
        r.add_error(
            JsonContext::root(),
            Keyword::MinItems,
            Some(json!(3)),
            json!([1, 1]),
            "too short".into(),
        );
        assert_eq!(r.to_json(), json!({"(root)": [["uniqueItems"], ["minItems", 3]]}));
    }

    #[test]
    fn display_prefixes_the_location() {
        let root = JsonContext::root();
        let ctx = JsonContext::child(&root, "name");
        let mut r = Report::default();
        r.add_error(ctx, Keyword::Required, None, json!(null), "is required".into());
        assert_eq!(r.errors()[0].to_string(), "(root).name: is required");
    }
}

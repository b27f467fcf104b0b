//! End-to-end validation coverage, keyword by keyword, asserted against the
//! serialized error-map form `{ location: [[keyword, requirement?], ...] }`.

use jsonvet::{validate, Schema};
use serde_json::{json, Value};

fn check(schema: Value, document: Value, expected: Value) {
    let schema = Schema::compile(&schema).expect("schema must compile");
    let report = validate(&schema, &document);
    assert_eq!(report.to_json(), expected, "document: {document}");
    assert_eq!(report.valid(), expected.as_object().map_or(true, |m| m.is_empty()));
}

fn check_valid(schema: Value, document: Value) {
    check(schema, document, json!({}));
}

// ------------------------------ Type gate -------------------------------- //

#[test]
fn type_gate_rejects_mismatched_tags() {
    check(json!({"type": "string"}), json!(42), json!({"(root)": [["type", "string"]]}));
    check(
        json!({"type": ["string", "number"]}),
        json!(true),
        json!({"(root)": [["type", "string,number"]]}),
    );
}

#[test]
fn integer_accepts_integral_floats_only() {
    check(json!({"type": "integer"}), json!(2.5), json!({"(root)": [["type", "integer"]]}));
    check_valid(json!({"type": "integer"}), json!(2.0));
    check_valid(json!({"type": "integer"}), json!(-7));
}

#[test]
fn number_accepts_every_numeric_value() {
    check_valid(json!({"type": "number"}), json!(3));
    check_valid(json!({"type": "number"}), json!(3.5));
    check(json!({"type": "number"}), json!("3"), json!({"(root)": [["type", "number"]]}));
}

#[test]
fn untyped_schemas_accept_everything() {
    for document in [json!(null), json!(true), json!(1.5), json!("x"), json!([1]), json!({"a": 1})] {
        check_valid(json!({}), document);
    }
}

#[test]
fn type_failure_suppresses_other_assertions() {
    check(
        json!({"type": "string", "minLength": 3}),
        json!(42),
        json!({"(root)": [["type", "string"]]}),
    );
}

// -------------------------------- Enum ----------------------------------- //

#[test]
fn enum_membership_is_canonical() {
    let schema = json!({"enum": [1, "a", [2, 3]]});
    check_valid(schema.clone(), json!(1));
    check_valid(schema.clone(), json!(1.0));
    check_valid(schema.clone(), json!([2.0, 3]));
    check(
        schema,
        json!(2),
        json!({"(root)": [["enum", [1, "a", [2, 3]]]]}),
    );
}

#[test]
fn enum_objects_compare_key_order_insensitively() {
    let schema = json!({"enum": [{"a": 1, "b": 2}]});
    check_valid(schema, json!({"b": 2, "a": 1}));
}

// ------------------------------- Strings --------------------------------- //

#[test]
fn string_lengths_count_code_points() {
    check(
        json!({"type": "string", "minLength": 3}),
        json!("hi"),
        json!({"(root)": [["minLength", 3]]}),
    );
    check_valid(json!({"minLength": 3}), json!("🦀🦀🦀"));
    check(
        json!({"maxLength": 2}),
        json!("abc"),
        json!({"(root)": [["maxLength", 2]]}),
    );
}

#[test]
fn pattern_is_a_partial_match() {
    check_valid(json!({"pattern": "ell"}), json!("hello"));
    check(
        json!({"pattern": "^a"}),
        json!("banana"),
        json!({"(root)": [["pattern", "^a"]]}),
    );
}

#[test]
fn independent_assertions_all_report() {
    check(
        json!({"minLength": 5, "pattern": "^a"}),
        json!("bcd"),
        json!({"(root)": [["minLength", 5], ["pattern", "^a"]]}),
    );
}

// ------------------------------- Numbers --------------------------------- //

#[test]
fn multiple_of_divides_exactly() {
    check_valid(json!({"multipleOf": 0.5}), json!(2));
    check_valid(json!({"multipleOf": 3}), json!(9));
    check(
        json!({"multipleOf": 2}),
        json!(7),
        json!({"(root)": [["multipleOf", 2]]}),
    );
}

#[test]
fn inclusive_and_exclusive_bounds() {
    check_valid(json!({"maximum": 10}), json!(10));
    check(
        json!({"maximum": 10}),
        json!(10.5),
        json!({"(root)": [["maximum", 10]]}),
    );
    check(
        json!({"maximum": 10, "exclusiveMaximum": true}),
        json!(10),
        json!({"(root)": [["exclusiveMaximum", 10]]}),
    );
    check_valid(json!({"minimum": 5}), json!(5));
    check(
        json!({"minimum": 5, "exclusiveMinimum": true}),
        json!(5),
        json!({"(root)": [["exclusiveMinimum", 5]]}),
    );
    check(
        json!({"minimum": 5}),
        json!(4),
        json!({"(root)": [["minimum", 5]]}),
    );
}

// -------------------------------- Arrays --------------------------------- //

#[test]
fn single_schema_items_cover_every_element() {
    check(
        json!({"items": {"type": "integer"}}),
        json!([1, "two", 3]),
        json!({"(root).1": [["type", "integer"]]}),
    );
}

#[test]
fn tuple_items_are_positional() {
    let schema = json!({"items": [{"type": "string"}, {"type": "integer"}]});
    check_valid(schema.clone(), json!(["a", 2]));
    check(
        schema.clone(),
        json!([5, "x"]),
        json!({
            "(root).0": [["type", "string"]],
            "(root).1": [["type", "integer"]]
        }),
    );
    // shorter than the tuple is the size bounds' business, not items'
    check_valid(schema.clone(), json!(["a"]));
    // longer is fine while additionalItems is unset
    check_valid(schema, json!(["a", 2, true]));
}

#[test]
fn additional_items_false_flags_each_extra_element() {
    let schema = json!({
        "type": "array",
        "items": [{"type": "string"}, {"type": "number"}],
        "additionalItems": false
    });
    check(
        schema.clone(),
        json!(["a", 1, true]),
        json!({"(root)": [["additionalItems", false]]}),
    );
    check(
        schema,
        json!(["a", 1, true, null]),
        json!({"(root)": [["additionalItems", false], ["additionalItems", false]]}),
    );
}

#[test]
fn additional_items_schema_covers_the_tail() {
    let schema = json!({"items": [{"type": "string"}], "additionalItems": {"type": "integer"}});
    check_valid(schema.clone(), json!(["a", 2, 3]));
    check(
        schema,
        json!(["a", 2, "x"]),
        json!({"(root).2": [["type", "integer"]]}),
    );
}

#[test]
fn positional_schemas_still_run_when_the_value_is_longer() {
    check(
        json!({"items": [{"type": "string"}], "additionalItems": true}),
        json!([5, "x"]),
        json!({"(root).0": [["type", "string"]]}),
    );
}

#[test]
fn array_size_bounds() {
    check(
        json!({"minItems": 2}),
        json!([1]),
        json!({"(root)": [["minItems", 2]]}),
    );
    check(
        json!({"maxItems": 1}),
        json!([1, 2]),
        json!({"(root)": [["maxItems", 1]]}),
    );
    check_valid(json!({"minItems": 1, "maxItems": 2}), json!([1, 2]));
}

#[test]
fn unique_items_compare_canonically() {
    check_valid(json!({"uniqueItems": true}), json!([1, "1", [1], {"a": 1}]));
    check(
        json!({"uniqueItems": true}),
        json!([1, 1.0, "1"]),
        json!({"(root)": [["uniqueItems"]]}),
    );
    check(
        json!({"uniqueItems": true}),
        json!([{"a": 1, "b": 2}, {"b": 2, "a": 1}]),
        json!({"(root)": [["uniqueItems"]]}),
    );
    // one error per duplicate beyond the first
    check(
        json!({"uniqueItems": true}),
        json!([1, 1, 1]),
        json!({"(root)": [["uniqueItems"], ["uniqueItems"]]}),
    );
}

// -------------------------------- Objects -------------------------------- //

#[test]
fn property_count_bounds() {
    check(
        json!({"minProperties": 2}),
        json!({"a": 1}),
        json!({"(root)": [["minProperties", 2]]}),
    );
    check(
        json!({"maxProperties": 1}),
        json!({"a": 1, "b": 2}),
        json!({"(root)": [["maxProperties", 1]]}),
    );
}

#[test]
fn required_reports_each_missing_name_at_its_path() {
    check(
        json!({"required": ["a", "b"]}),
        json!({"a": 1}),
        json!({"(root).b": [["required"]]}),
    );
    check(
        json!({"required": ["a", "b"]}),
        json!({}),
        json!({
            "(root).a": [["required"]],
            "(root).b": [["required"]]
        }),
    );
}

#[test]
fn declared_properties_validate_in_place() {
    check(
        json!({"properties": {"name": {"type": "string"}, "age": {"type": "integer"}}}),
        json!({"name": 1, "age": "x"}),
        json!({
            "(root).name": [["type", "string"]],
            "(root).age": [["type", "integer"]]
        }),
    );
}

#[test]
fn additional_properties_false_with_patterns() {
    let schema = json!({
        "type": "object",
        "properties": {"a": {"type": "string"}},
        "patternProperties": {"^x": {"type": "number"}},
        "additionalProperties": false
    });
    check_valid(schema.clone(), json!({"a": "ok", "x1": 5}));
    check(
        schema,
        json!({"a": "ok", "x1": 5, "y": 1}),
        json!({"(root).y": [["additionalProperties"]]}),
    );
}

#[test]
fn additional_properties_schema_runs_under_the_parent_context() {
    let schema = json!({
        "properties": {"a": {}},
        "additionalProperties": {"type": "string"}
    });
    check_valid(schema.clone(), json!({"a": 1, "b": "ok"}));
    check(
        schema,
        json!({"a": 1, "b": 2}),
        json!({"(root)": [["type", "string"]]}),
    );
}

#[test]
fn pattern_properties_failures_surface_without_additional_properties() {
    let schema = json!({"patternProperties": {"^x": {"type": "integer"}}});
    check_valid(schema.clone(), json!({"x1": 3, "other": "ignored"}));
    let report = validate(
        &Schema::compile(&schema).unwrap(),
        &json!({"x1": "not a number"}),
    );
    let serialized = report.to_json();
    let entries = serialized["(root).x1"].as_array().unwrap();
    assert_eq!(entries[0], json!(["type", "integer"]));
    assert_eq!(entries[1][0], json!("patternProperties"));
}

#[test]
fn every_matching_pattern_must_accept_the_value() {
    // "xy1" matches both patterns; the integer one rejects it
    let schema = json!({
        "patternProperties": {
            "^x": {"type": "string"},
            "y": {"type": "integer"}
        },
        "additionalProperties": false
    });
    let report = validate(&Schema::compile(&schema).unwrap(), &json!({"xy1": "s"}));
    assert!(!report.valid());
    let serialized = report.to_json();
    let entries = serialized["(root).xy1"].as_array().unwrap();
    assert!(entries.iter().any(|e| e[0] == json!("type")));
    assert!(entries.iter().any(|e| e[0] == json!("additionalProperties")));
}

#[test]
fn property_dependencies_report_at_the_triggering_key() {
    check(
        json!({"type": "object", "dependencies": {"credit_card": ["billing_address"]}}),
        json!({"credit_card": 123}),
        json!({"(root).credit_card": [["dependencies", ["billing_address"]]]}),
    );
    check_valid(
        json!({"dependencies": {"credit_card": ["billing_address"]}}),
        json!({"credit_card": 123, "billing_address": "10 Main St"}),
    );
    // the dependency only fires when the trigger is present
    check_valid(
        json!({"dependencies": {"credit_card": ["billing_address"]}}),
        json!({"billing_address": "10 Main St"}),
    );
}

#[test]
fn schema_dependencies_revalidate_the_whole_object() {
    let schema = json!({"dependencies": {"a": {"required": ["b"]}}});
    check_valid(schema.clone(), json!({"a": 1, "b": 2}));
    check(schema, json!({"a": 1}), json!({"(root).b": [["required"]]}));
}

// ------------------------------ Combinators ------------------------------ //

#[test]
fn all_of_merges_sub_errors_and_adds_a_summary() {
    check_valid(json!({"allOf": [{"type": "integer"}, {"minimum": 3}]}), json!(5));
    check(
        json!({"allOf": [{"type": "integer"}, {"minimum": 5}]}),
        json!(3),
        json!({"(root)": [
            ["minimum", 5],
            ["allOf", [{"type": "integer"}, {"minimum": 5}]]
        ]}),
    );
}

#[test]
fn all_of_over_trivial_schemas_always_succeeds() {
    check_valid(json!({"allOf": [{}, {}, {}]}), json!("anything"));
}

#[test]
fn any_of_short_circuits_on_the_first_match() {
    check_valid(json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}), json!(3));
    check_valid(json!({"anyOf": [{"type": "string"}, {"type": "integer"}]}), json!("s"));
}

#[test]
fn any_of_merges_the_closest_alternative() {
    let schema = json!({"anyOf": [
        {"type": "string"},
        {"type": "object", "required": ["a", "b"]}
    ]});
    // the object alternative got much further than the string one
    check(schema, json!({"a": 1}), json!({"(root).b": [["required"]]}));
}

#[test]
fn any_of_with_one_alternative_behaves_like_that_alternative() {
    let wrapped = Schema::compile(&json!({"anyOf": [{"type": "string"}]})).unwrap();
    let bare = Schema::compile(&json!({"type": "string"})).unwrap();
    let document = json!(5);
    assert_eq!(
        validate(&wrapped, &document).to_json(),
        validate(&bare, &document).to_json(),
    );
}

#[test]
fn any_of_ties_fall_back_to_a_summary_error() {
    check(
        json!({"anyOf": [{"type": "string"}, {"type": "number"}]}),
        json!(true),
        json!({"(root)": [["anyOf", [{"type": "string"}, {"type": "number"}]]]}),
    );
}

#[test]
fn one_of_accepts_exactly_one_match() {
    check_valid(json!({"oneOf": [{"type": "string"}, {"type": "integer"}]}), json!(3));
    // both alternatives match an integer
    check(
        json!({"oneOf": [{"type": "integer"}, {"type": "number"}]}),
        json!(1),
        json!({"(root)": [["oneOf", [{"type": "integer"}, {"type": "number"}]]]}),
    );
}

#[test]
fn one_of_zero_matches_reports_the_best_failure() {
    let schema = json!({"oneOf": [
        {"type": "string"},
        {"type": "object", "required": ["a"]}
    ]});
    check(schema, json!({"b": 1}), json!({"(root).a": [["required"]]}));
}

#[test]
fn one_of_tie_reports_the_summary() {
    check(
        json!({"oneOf": [{"type": "string"}, {"type": "number"}]}),
        json!(true),
        json!({"(root)": [["oneOf", [{"type": "string"}, {"type": "number"}]]]}),
    );
}

#[test]
fn not_inverts_and_discards_sub_errors() {
    check_valid(json!({"not": {"type": "string"}}), json!(5));
    check(
        json!({"not": {"type": "string"}}),
        json!("s"),
        json!({"(root)": [["not", {"type": "string"}]]}),
    );
    // `not` over the empty schema rejects everything
    check(
        json!({"not": {}}),
        json!(5),
        json!({"(root)": [["not", {}]]}),
    );
}

// ------------------------------ References ------------------------------- //

#[test]
fn refs_resolve_through_definitions() {
    let schema = json!({
        "definitions": {"positive": {"type": "integer", "minimum": 1}},
        "type": "object",
        "properties": {"count": {"$ref": "#/definitions/positive"}}
    });
    check_valid(schema.clone(), json!({"count": 3}));
    check(schema, json!({"count": 0}), json!({"(root).count": [["minimum", 1]]}));
}

#[test]
fn recursive_refs_follow_the_document_depth() {
    let schema = json!({
        "type": "object",
        "properties": {
            "value": {"type": "integer"},
            "next": {"$ref": "#"}
        }
    });
    check_valid(schema.clone(), json!({"value": 1, "next": {"value": 2}}));
    check(
        schema,
        json!({"value": 1, "next": {"next": {"value": "x"}}}),
        json!({"(root).next.next.value": [["type", "integer"]]}),
    );
}

// ------------------------------- Contexts -------------------------------- //

#[test]
fn nested_locations_join_with_dots() {
    let schema = json!({
        "items": {"type": "object", "properties": {"name": {"type": "string"}}}
    });
    check(
        schema,
        json!([{"name": "ok"}, {"name": 7}]),
        json!({"(root).1.name": [["type", "string"]]}),
    );
}

// ----------------------------- Determinism ------------------------------- //

#[test]
fn reports_are_byte_identical_across_runs() {
    let schema = Schema::compile(&json!({
        "type": "object",
        "properties": {"a": {"type": "string"}, "b": {"minimum": 3}},
        "patternProperties": {"^x": {"type": "integer"}},
        "additionalProperties": false,
        "required": ["a", "missing"]
    }))
    .unwrap();
    let document = json!({"a": 5, "b": 1, "x1": "no", "extra": true});
    let first = serde_json::to_string(&validate(&schema, &document).to_json()).unwrap();
    let second = serde_json::to_string(&validate(&schema, &document).to_json()).unwrap();
    assert_eq!(first, second);
}

//! Analysis facts and parse-result cache behavior.

use std::rc::Rc;

use pdxlint_core::analysis::ValueShape;
use pdxlint_core::ast::AstValue;
use pdxlint_core::parser::ParseMode;
use pdxlint_core::result::{parse_result, parse_result_with_mode};

#[test]
fn top_level_values_preserve_repeats_in_order() {
    let parse = parse_result("a=1\nb=\"hello\"\na=2\n");
    let facts = parse.analysis_facts();

    let values = facts.top_level_values.get("a").expect("a values");
    assert_eq!(values.len(), 2);
    match (&values[0], &values[1]) {
        (Some(AstValue::Scalar(first)), Some(AstValue::Scalar(second))) => {
            assert_eq!(first.raw_text, "1");
            assert_eq!(second.raw_text, "2");
        }
        other => panic!("expected scalar values, got {other:?}"),
    }
}

#[test]
fn top_level_shapes_group_into_sets() {
    let parse = parse_result("value=1\nvalue={ a=1 }\ncolor = rgb { 1 2 3 }\nmissing=\n");
    let facts = parse.analysis_facts();

    let value_shapes = facts.top_level_shapes.get("value").expect("value shapes");
    assert_eq!(value_shapes.len(), 2);
    assert!(value_shapes.contains(&ValueShape::Scalar));
    assert!(value_shapes.contains(&ValueShape::Block));

    let color_shapes = facts.top_level_shapes.get("color").expect("color shapes");
    assert!(color_shapes.contains(&ValueShape::Tagged));

    let missing_shapes = facts.top_level_shapes.get("missing").expect("missing shapes");
    assert!(missing_shapes.contains(&ValueShape::Missing));
}

#[test]
fn nested_object_fields_track_occurrence_indexes() {
    let parse = parse_result("technology={ level=1 level=2 cost=3 }\ntechnology={ level=4 }\n");
    let facts = parse.analysis_facts();

    let field_facts = facts.object_fields.get("technology").expect("field facts");
    let observed: Vec<(Vec<String>, usize, usize)> = field_facts
        .iter()
        .map(|fact| {
            (
                fact.path.clone(),
                fact.object_occurrence,
                fact.field_occurrence,
            )
        })
        .collect();
    assert_eq!(
        observed,
        vec![
            (
                vec!["technology".to_string(), "level".to_string()],
                0,
                0
            ),
            (
                vec!["technology".to_string(), "level".to_string()],
                0,
                1
            ),
            (vec!["technology".to_string(), "cost".to_string()], 0, 0),
            (
                vec!["technology".to_string(), "level".to_string()],
                1,
                0
            ),
        ]
    );

    let by_field = facts
        .object_field_map
        .get("technology")
        .expect("field map");
    assert_eq!(by_field.get("level").map(Vec::len), Some(3));
    assert_eq!(by_field.get("cost").map(Vec::len), Some(1));
    assert_eq!(facts.all_field_facts.len(), 4);
}

#[test]
fn non_object_like_blocks_are_skipped_by_the_field_index() {
    let parse = parse_result("technology={ a=1 2 }\n");
    let facts = parse.analysis_facts();

    assert!(!facts.object_fields.contains_key("technology"));
    assert!(!facts.object_field_map.contains_key("technology"));
    assert!(facts.all_field_facts.is_empty());
}

#[test]
fn deep_nesting_contributes_paths_to_all_field_facts_only() {
    let parse = parse_result("a={ b={ c=1 } d=2 }\n");
    let facts = parse.analysis_facts();

    let immediate = facts.object_fields.get("a").expect("immediate facts");
    let immediate_keys: Vec<&str> = immediate
        .iter()
        .map(|fact| fact.field_key.as_str())
        .collect();
    assert_eq!(immediate_keys, vec!["b", "d"]);

    let deep = facts
        .all_field_facts
        .iter()
        .find(|fact| fact.field_key == "c")
        .expect("nested fact");
    assert_eq!(
        deep.path,
        vec!["a".to_string(), "b".to_string(), "c".to_string()]
    );
}

#[test]
fn parse_result_exposes_green_diagnostics_and_error_state() {
    let result = parse_result("a=1\n");
    assert!(result.diagnostics().is_empty());
    assert!(!result.has_errors());
    assert_eq!(result.green_root().text(), "a=1\n");
}

#[test]
fn parse_result_caches_are_idempotent() {
    let result = parse_result("a=1\n");

    let first_syntax = result.syntax_root();
    let second_syntax = result.syntax_root();
    assert_eq!(first_syntax, second_syntax);

    let first_ast = result.ast_root();
    let second_ast = result.ast_root();
    assert!(Rc::ptr_eq(&first_ast, &second_ast));

    let first_view = result.root_view();
    let second_view = result.root_view();
    assert!(Rc::ptr_eq(&first_view, &second_view));

    let first_facts = result.analysis_facts();
    let second_facts = result.analysis_facts();
    let third_facts = result.analysis_facts();
    assert!(Rc::ptr_eq(&first_facts, &second_facts));
    assert!(Rc::ptr_eq(&second_facts, &third_facts));
}

#[test]
fn root_view_exposes_top_level_object_shape() {
    let result = parse_result("a=1\n");
    let view = result.root_view();
    let object = view.as_object().expect("object view");

    match object.get("a") {
        Some(Some(AstValue::Scalar(scalar))) => assert_eq!(scalar.raw_text, "1"),
        other => panic!("expected scalar, got {other:?}"),
    }
}

#[test]
fn root_view_is_empty_for_empty_source() {
    let result = parse_result("");
    let view = result.root_view();

    assert!(view.is_empty_ambiguous());
    assert_eq!(view.as_object().map(|object| object.len()), Some(0));
    assert_eq!(view.as_multimap().map(|multimap| multimap.len()), Some(0));
    assert_eq!(view.as_array().map(|array| array.len()), Some(0));
}

#[test]
fn strict_and_permissive_results_differ_in_error_state() {
    let source = "a=\"x\";\n";

    let strict = parse_result(source);
    let permissive = parse_result_with_mode(source, ParseMode::Permissive);

    assert!(strict.has_errors());
    assert!(!permissive.has_errors());
}
